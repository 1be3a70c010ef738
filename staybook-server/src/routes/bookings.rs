//! Guest booking endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use staybook_core::booking::Booking;
use staybook_core::{BookingReceipt, BookingRequest};

use crate::auth::Admin;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
}

/// POST /bookings - Hold the nights and open a checkout session
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = state.market.create_booking(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.market.booking(&id).await?))
}

#[derive(Deserialize)]
pub struct CancelRequest {
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "cancelled by admin".to_string()
}

/// POST /bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.market.cancel_booking(&id, &body.reason).await?))
}
