use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};

use crate::api::response::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API key is required")]
    MissingCredential,

    #[error("{0}")]
    MissingParameter(&'static str),

    #[error("Failed to fetch the chart image")]
    UpstreamFetchFailed,

    #[error("{0}")]
    FetchError(String),

    #[error("{0}")]
    CollaboratorFailure(String),

    #[error("{0}")]
    StorageWriteFailure(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential
            | AppError::MissingParameter(_)
            | AppError::UpstreamFetchFailed => StatusCode::BAD_REQUEST,
            AppError::FetchError(_)
            | AppError::CollaboratorFailure(_)
            | AppError::StorageWriteFailure(_)
            | AppError::InvalidRequest(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::CollaboratorFailure(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_validation_failures_are_client_errors() {
        assert_eq!(AppError::MissingCredential.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MissingParameter("Chart URL not provided").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::UpstreamFetchFailed.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn everything_else_is_a_server_error() {
        for err in [
            AppError::FetchError("dns".into()),
            AppError::CollaboratorFailure("boom".into()),
            AppError::StorageWriteFailure("disk full".into()),
            AppError::InvalidRequest("bad json".into()),
        ] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(AppError::MissingCredential.to_string(), "API key is required");
        assert_eq!(
            AppError::MissingParameter("Chart URL not provided").to_string(),
            "Chart URL not provided"
        );
        assert_eq!(
            AppError::UpstreamFetchFailed.to_string(),
            "Failed to fetch the chart image"
        );
        assert_eq!(AppError::CollaboratorFailure("boom".into()).to_string(), "boom");
    }
}
