//! Request guards for admin endpoints and payment webhooks.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::routes::AppError;
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Present in a handler's arguments when the caller sent the admin token
/// as `Authorization: Bearer <token>`.
pub struct Admin;

impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.admin_token else {
            return Err(AppError::Unauthorized(
                "admin endpoints are disabled (no admin_token configured)".into(),
            ));
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(Admin),
            _ => Err(AppError::Unauthorized("invalid or missing admin token".into())),
        }
    }
}

/// Check the shared secret a payment provider sends with webhooks.
pub fn verify_webhook(headers: &HeaderMap, state: &AppState) -> Result<(), AppError> {
    let Some(expected) = &state.webhook_secret else {
        return Err(AppError::Unauthorized("no webhook_secret configured".into()));
    };
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("invalid webhook secret".into()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
