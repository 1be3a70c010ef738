//! iCal export and feed preview

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use staybook_core::event::FeedEvent;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties/{id}/calendar.ics", get(export_calendar))
        .route("/ical/preview", get(preview_feed))
}

/// GET /properties/{id}/calendar.ics - Booked nights for channel managers
async fn export_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ics = state.market.export_calendar(&id).await?;
    Ok(([(header::CONTENT_TYPE, "text/calendar; charset=utf-8")], ics))
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    pub url: String,
}

/// GET /ical/preview?url= - Parse a feed without storing it
async fn preview_feed(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Vec<FeedEvent>>, AppError> {
    Ok(Json(state.market.preview_feed(&query.url).await?))
}
