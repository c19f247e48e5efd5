use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("URL parameter is required.")]
    MissingUrl,

    #[error("Timeout waiting for resources.")]
    ResourceTimeout,

    #[error("{0}")]
    Automation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingUrl => StatusCode::BAD_REQUEST,
            AppError::ResourceTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Automation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Automation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
