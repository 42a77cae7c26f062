//! Application error types with HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Application-level errors for Stackscan.
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Invalid GitHub URL: {0}")]
    InvalidReference(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    // Pipeline errors
    #[error("Error cloning {repository}")]
    Fetch { repository: String, cause: String },

    #[error("Analysis failed: {cause}")]
    Analysis { cause: String },

    // Store errors
    #[error("PostgreSQL error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Store error: {message}")]
    Store { message: String },

    // Boundary errors
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Raw diagnostic text behind the error, when it carries one.
    pub fn cause(&self) -> Option<&str> {
        match self {
            AppError::Fetch { cause, .. } | AppError::Analysis { cause } => Some(cause),
            _ => None,
        }
    }

    /// Message including the underlying cause, used for batch item records.
    pub fn detailed_message(&self) -> String {
        match self.cause() {
            Some(cause) if !cause.trim().is_empty() => format!("{}: {}", self, cause.trim()),
            _ => self.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidReference(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Analysis { .. }
            | AppError::Database(_)
            | AppError::Store { .. }
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Unauthorized => json!({ "error": "Unauthorized" }),
            AppError::BadRequest(message) => json!({ "error": message }),
            _ => json!({
                "error": "Analysis error",
                "details": self.detailed_message(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
