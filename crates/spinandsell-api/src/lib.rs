//! SpinAndSell — HTTP API.
//!
//! Axum routes over the catalogue, messaging and checkout contexts, plus the
//! Stripe webhook receiver.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router with HTTP middleware.
pub fn build_router(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the storefront origin once it is configurable.
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
