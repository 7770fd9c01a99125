use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote service returned status {status}: {body}")]
    RemoteService { status: u16, body: String },

    /// Built without the request URL so credentials never reach messages or logs
    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    #[error("Remote service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A recommendation request is already in progress")]
    Busy,

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpClient(err.without_url())
    }
}

impl AppError {
    /// Whether the error comes from the remote advisor boundary
    /// (credential, transport, upstream status or deadline).
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            AppError::Configuration(_)
                | AppError::RemoteService { .. }
                | AppError::HttpClient(_)
                | AppError::Timeout(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Busy => (StatusCode::CONFLICT, self.to_string()),
            AppError::Configuration(_) | AppError::InvalidCatalog(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::RemoteService { .. } | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
