//! Error types for DocSign API

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docsign_core::CoreError;
use serde_json::{json, Value};
use thiserror::Error;

use crate::mailer::MailError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Signing workflow error: {0}")]
    Core(#[from] CoreError),

    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_)
            | ApiError::Core(_)
            | ApiError::Mail(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Underlying message of a failed request, attached to the response so the
/// development-only middleware can surface it
#[derive(Debug, Clone)]
pub struct ErrorReport {
    message: String,
    details: String,
}

fn error_body(status: StatusCode, message: &str) -> Value {
    json!({
        "success": false,
        "error": message,
        "status": status.as_u16(),
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let report = ErrorReport {
            details: self.to_string(),
            message: message.clone(),
        };
        let mut response = (status, Json(error_body(status, &message))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Add the underlying error message as `details` when running in development
pub async fn expose_error_details(
    State(state): State<Arc<AppState>>,
    mut response: Response,
) -> Response {
    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };
    if !state.config.is_development() {
        return response;
    }

    let status = response.status();
    let mut body = error_body(status, &report.message);
    body["details"] = Value::String(report.details);
    (status, Json(body)).into_response()
}
