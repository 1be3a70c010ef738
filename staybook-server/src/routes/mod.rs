pub mod bookings;
pub mod calendar;
pub mod health;
pub mod invoices;
pub mod jobs;
pub mod parties;
pub mod payments;
pub mod properties;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use staybook_core::StaybookError;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum AppError {
    Core(StaybookError),
    Unauthorized(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Core(err) => match err {
                StaybookError::NotFound { .. } => StatusCode::NOT_FOUND,
                StaybookError::Validation(_) | StaybookError::IcsParse(_) => StatusCode::BAD_REQUEST,
                StaybookError::Conflict(_) | StaybookError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                StaybookError::Feed(_) | StaybookError::Payment(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Core(err) => err.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(%status, "{message}");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<StaybookError> for AppError {
    fn from(err: StaybookError) -> Self {
        AppError::Core(err)
    }
}
