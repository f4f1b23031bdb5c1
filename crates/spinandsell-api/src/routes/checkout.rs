//! Routes for starting a hosted checkout.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use spinandsell_checkout::application::checkout::handle_create_checkout;
use spinandsell_checkout::domain::commands::CreateCheckout;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

/// Request body for POST /checkout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub product_id: Uuid,
}

/// Where to send the buyer next.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub session_id: String,
}

/// POST /checkout
#[instrument(skip(state, request), fields(product_id = %request.product_id, buyer_id = %buyer))]
async fn create_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(buyer): AuthenticatedUser,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let command = CreateCheckout {
        correlation_id: Uuid::new_v4(),
        listing_id: request.product_id,
        buyer_id: buyer,
    };

    let session = handle_create_checkout(&command, state.services()).await?;

    Ok(Json(CheckoutResponse {
        checkout_url: session.url,
        session_id: session.id,
    }))
}

/// Returns the router for checkout.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_checkout))
}
