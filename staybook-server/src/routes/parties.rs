//! Employer and owner endpoints (admin only)

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Map, Value};

use staybook_core::party::{Employer, Owner, PartyDraft};

use crate::auth::Admin;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employers", get(list_employers).post(create_employer))
        .route(
            "/employers/{id}",
            get(get_employer).put(update_employer).delete(delete_employer),
        )
        .route("/owners", get(list_owners).post(create_owner))
        .route(
            "/owners/{id}",
            get(get_owner).put(update_owner).delete(delete_owner),
        )
}

async fn list_employers(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<Employer>>, AppError> {
    Ok(Json(state.market.employers().await?))
}

async fn create_employer(
    State(state): State<AppState>,
    _admin: Admin,
    Json(draft): Json<PartyDraft>,
) -> Result<(StatusCode, Json<Employer>), AppError> {
    let employer = state.market.create_employer(draft).await?;
    Ok((StatusCode::CREATED, Json(employer)))
}

async fn get_employer(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<Json<Employer>, AppError> {
    Ok(Json(state.market.employer(&id).await?))
}

async fn update_employer(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Employer>, AppError> {
    Ok(Json(state.market.update_employer(&id, fields).await?))
}

async fn delete_employer(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.market.delete_employer(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_owners(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<Owner>>, AppError> {
    Ok(Json(state.market.owners().await?))
}

async fn create_owner(
    State(state): State<AppState>,
    _admin: Admin,
    Json(draft): Json<PartyDraft>,
) -> Result<(StatusCode, Json<Owner>), AppError> {
    let owner = state.market.create_owner(draft).await?;
    Ok((StatusCode::CREATED, Json(owner)))
}

async fn get_owner(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<Json<Owner>, AppError> {
    Ok(Json(state.market.owner(&id).await?))
}

async fn update_owner(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Owner>, AppError> {
    Ok(Json(state.market.update_owner(&id, fields).await?))
}

async fn delete_owner(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.market.delete_owner(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
