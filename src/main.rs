use tokio::net::TcpListener;
use scrape_gateway::{
    config::Config,
    api::routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrape_gateway=info,tower_http=info".into()),
        )
        .init();

    let config = Config::load()?;
    let server_addr = config.server_addr;
    tracing::info!(
        static_dir = %config.static_dir.display(),
        public_base_url = ?config.public_base_url,
        "configuration loaded"
    );

    let app_state = AppState::with_smart_scraper(config)?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
