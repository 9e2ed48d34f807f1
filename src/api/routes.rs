use axum::{
    routing::{get, post},
    Router,
    extract::{Json, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::{header, HeaderMap},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use std::time::Instant;

use crate::error::{Result, AppError};
use crate::api::models::{ChartImageQuery, ScrapeRequest, DEFAULT_PROMPT, DEFAULT_SOURCE_URL};
use crate::api::response::{ImageResponse, ScrapeResponse};
use crate::collaborator::{GraphConfig, ScrapeJob, ScrapeResult};
use crate::storage::STATIC_MOUNT;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let static_files = ServeDir::new(&app_state.config.static_dir);

    Router::new()
        .route("/", get(home))
        .route("/scrape", post(scrape_handler))
        .route("/get_chart_image", get(chart_image_handler))
        .nest_service(STATIC_MOUNT, static_files)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn home() -> &'static str {
    "Scrape gateway is running!"
}

async fn scrape_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>> {
    let Json(req) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let api_key = req
        .api_key
        .filter(|key| !key.is_empty())
        .ok_or(AppError::MissingCredential)?;

    let job = ScrapeJob {
        config: GraphConfig::for_api_key(api_key),
        prompt: req.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
        source_url: req.source_url.unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
    };

    tracing::info!(source_url = %job.source_url, "processing scrape request");
    let start_time = Instant::now();

    let result = state
        .collaborator
        .run(&job)
        .await
        .map_err(|err| match err {
            AppError::CollaboratorFailure(_) => err,
            other => AppError::CollaboratorFailure(other.to_string()),
        })?;

    let data = normalize_result(&result)?;

    tracing::info!(
        source_url = %job.source_url,
        elapsed = ?start_time.elapsed(),
        "scrape request completed"
    );
    Ok(Json(ScrapeResponse::success(data)))
}

/// Serializes and re-parses the collaborator output so only valid JSON leaves the gateway.
fn normalize_result(result: &ScrapeResult) -> Result<ScrapeResult> {
    let serialized = serde_json::to_string_pretty(result)?;
    Ok(serde_json::from_str(&serialized)?)
}

async fn chart_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ImageResponse>> {
    let Query(pairs) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let query = ChartImageQuery::from_pairs(pairs);

    let chart_url = query
        .chart_url
        .filter(|url| !url.is_empty())
        .ok_or(AppError::MissingParameter("Chart URL not provided"))?;

    tracing::info!(chart_url = %chart_url, "fetching chart image");
    let response = state.http.get(&chart_url).send().await?;

    if response.status() != reqwest::StatusCode::OK {
        tracing::warn!(chart_url = %chart_url, status = %response.status(), "chart host refused");
        return Err(AppError::UpstreamFetchFailed);
    }

    let bytes = response.bytes().await?;
    let base_url = public_base_url(&state, &headers);
    let artifact = state.images.store(&bytes, &base_url).await?;

    tracing::info!(image_url = %artifact.public_url, size = artifact.size, "chart image cached");
    Ok(Json(ImageResponse {
        image_url: artifact.public_url,
    }))
}

fn public_base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }

    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_else(|| format!("http://{}", state.config.server_addr))
}
