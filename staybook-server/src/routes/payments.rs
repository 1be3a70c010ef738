//! Checkout sessions and the payment webhook

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use serde::Deserialize;

use staybook_core::booking::Booking;
use staybook_core::payment::CheckoutSession;

use crate::auth::verify_webhook;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/sessions/{id}", get(get_session))
        .route("/payments/webhook", post(webhook))
}

/// GET /payments/sessions/{id} - Amount and dates for the payment page
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutSession>, AppError> {
    Ok(Json(state.market.checkout_session(&id).await?))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
    Expired,
}

#[derive(Deserialize)]
pub struct WebhookEvent {
    pub session_id: String,
    pub outcome: PaymentOutcome,
}

/// POST /payments/webhook - Payment provider reports a session outcome
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<Booking>, AppError> {
    verify_webhook(&headers, &state)?;

    let booking = match event.outcome {
        PaymentOutcome::Succeeded => state.market.confirm_payment(&event.session_id).await?,
        PaymentOutcome::Failed | PaymentOutcome::Expired => {
            state.market.fail_payment(&event.session_id).await?
        }
    };
    Ok(Json(booking))
}
