//! Property endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use staybook_core::RefreshReport;
use staybook_core::booking::Booking;
use staybook_core::property::{NewProperty, Property, PropertyPatch, PropertyStatus};

use crate::auth::Admin;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties", get(list_properties).post(create_property))
        .route(
            "/properties/{id}",
            get(get_property).patch(update_property).delete(delete_property),
        )
        .route("/properties/{id}/status", post(set_status))
        .route("/properties/{id}/availability", get(availability))
        .route("/properties/{id}/availability/refresh", post(refresh_property))
        .route("/properties/{id}/bookings", get(list_bookings))
        .route("/availability/refresh", post(refresh_all))
}

/// GET /properties - Published properties
async fn list_properties(State(state): State<AppState>) -> Result<Json<Vec<Property>>, AppError> {
    Ok(Json(state.market.properties(false).await?))
}

/// POST /properties
async fn create_property(
    State(state): State<AppState>,
    _admin: Admin,
    Json(new): Json<NewProperty>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    let property = state.market.create_property(new).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// GET /properties/{id}
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(state.market.property(&id).await?))
}

/// PATCH /properties/{id}
async fn update_property(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(patch): Json<PropertyPatch>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(state.market.update_property(&id, patch).await?))
}

/// DELETE /properties/{id}
async fn delete_property(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.market.delete_property(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: PropertyStatus,
}

/// POST /properties/{id}/status - Publish or unpublish
async fn set_status(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(state.market.set_property_status(&id, body.status).await?))
}

#[derive(Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize)]
pub struct Availability {
    pub property_id: String,
    pub dates: Vec<NaiveDate>,
}

/// GET /properties/{id}/availability?from=&to=
async fn availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Availability>, AppError> {
    let dates = state.market.available_dates(&id, range.from, range.to).await?;
    Ok(Json(Availability {
        property_id: id,
        dates,
    }))
}

/// POST /properties/{id}/availability/refresh - Refetch iCal feeds now
async fn refresh_property(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<Json<RefreshReport>, AppError> {
    Ok(Json(state.market.refresh_property(&id).await?))
}

/// POST /availability/refresh - Refetch every property's feeds
async fn refresh_all(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<RefreshReport>>, AppError> {
    Ok(Json(state.market.refresh_all().await?))
}

/// GET /properties/{id}/bookings
async fn list_bookings(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.market.bookings_for_property(&id).await?))
}
