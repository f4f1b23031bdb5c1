//! Route modules organized by bounded context.

pub mod checkout;
pub mod conversations;
pub mod favorites;
pub mod health;
pub mod listings;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Every route of the API, without middleware or state.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/checkout", checkout::router())
        .nest("/api/v1/webhooks", webhooks::router())
        .nest("/api/v1/listings", listings::router())
        .nest("/api/v1/favorites", favorites::router())
        .nest("/api/v1/conversations", conversations::router())
}
