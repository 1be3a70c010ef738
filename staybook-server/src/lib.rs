//! HTTP API for staybook.

pub mod auth;
pub mod routes;
pub mod singleton;
pub mod state;
pub mod tasks;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use crate::state::AppState;

/// Every route of the API, with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::properties::router())
        .merge(routes::calendar::router())
        .merge(routes::bookings::router())
        .merge(routes::payments::router())
        .merge(routes::invoices::router())
        .merge(routes::jobs::router())
        .merge(routes::parties::router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
