//! Invoice endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use staybook_core::invoice::{Invoice, NewInvoice, PaymentInfo};

use crate::auth::Admin;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/pay", post(pay_invoice))
}

/// GET /invoices
async fn list_invoices(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<Invoice>>, AppError> {
    Ok(Json(state.market.invoices().await?))
}

/// POST /invoices
async fn create_invoice(
    State(state): State<AppState>,
    _admin: Admin,
    Json(new): Json<NewInvoice>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let invoice = state.market.create_invoice(new).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /invoices/{id} - Shown to the customer on the payment page
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.market.invoice(&id).await?))
}

/// POST /invoices/{id}/pay - Record a settled payment
async fn pay_invoice(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(payment): Json<PaymentInfo>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.market.pay_invoice(&id, payment).await?))
}
