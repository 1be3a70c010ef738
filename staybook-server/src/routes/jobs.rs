//! Job listing endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use staybook_core::job::{JobDraft, JobListing, JobPage, JobQuery};

use crate::auth::Admin;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/{id}", get(get_job).put(update_job).delete(delete_job))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// GET /jobs?limit= - Newest listings first
async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobListing>>, AppError> {
    Ok(Json(state.market.jobs(query.limit).await?))
}

/// POST /jobs
async fn create_job(
    State(state): State<AppState>,
    _admin: Admin,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<JobListing>), AppError> {
    let job = state.market.create_job(draft).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs/search?industry=&location=&salary_min=&sort_by=&sort_order=&page_size=&page_token=
async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> Result<Json<JobPage>, AppError> {
    Ok(Json(state.market.search_jobs(&query).await?))
}

/// GET /jobs/{id}
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobListing>, AppError> {
    Ok(Json(state.market.job(&id).await?))
}

/// PUT /jobs/{id} - Overwrite the given fields
async fn update_job(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<JobListing>, AppError> {
    Ok(Json(state.market.update_job(&id, fields).await?))
}

/// DELETE /jobs/{id}
async fn delete_job(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.market.delete_job(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
