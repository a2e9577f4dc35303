//! Router construction for the ingester binary (`CorsLayer` + `TraceLayer`).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ingester::handlers::{health, trigger, IngesterState};

pub fn create_router(state: IngesterState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trigger", post(trigger))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
