//! Inbound payment provider webhooks.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use tracing::instrument;

use spinandsell_checkout::application::webhook::handle_payment_event;
use spinandsell_checkout::domain::events::PaymentEvent;
use spinandsell_core::error::DomainError;
use spinandsell_providers::signature::verify_signature;

use crate::error::ApiError;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /webhooks/stripe
///
/// The body is read raw: the signature covers the exact bytes sent.
#[instrument(skip_all, fields(bytes = body.len()))]
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let secret = state.webhook.secret.as_deref().ok_or_else(|| {
        DomainError::Infrastructure("webhook signing secret is not configured".to_owned())
    })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DomainError::Validation("missing Stripe-Signature header".to_owned()))?;

    verify_signature(
        &body,
        signature,
        secret,
        state.webhook.tolerance_secs,
        state.clock.now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "rejected webhook signature");
        DomainError::Validation(format!("invalid signature: {e}"))
    })?;

    let event = PaymentEvent::from_payload(&body)?;
    handle_payment_event(&event, state.services()).await?;

    Ok(Json(WebhookAck { received: true }))
}

/// Returns the router for provider webhooks.
pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use spinandsell_core::clock::Clock;
    use spinandsell_providers::signature::sign_payload;
    use spinandsell_test_support::{
        FailingRepository, FixedClock, InMemoryMarketplace, listing_fixture, user_fixture,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::routes::testing::{WEBHOOK_SECRET, state_with};

    fn completed_event(listing_id: uuid::Uuid, seller_id: uuid::Uuid, buyer_id: uuid::Uuid) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "payment_intent": "pi_1",
                "amount_total": 89900,
                "currency": "eur",
                "metadata": {
                    "productId": listing_id.to_string(),
                    "sellerId": seller_id.to_string(),
                    "buyerId": buyer_id.to_string(),
                    "platformFee": "4495"
                }
            }}
        }))
        .unwrap()
    }

    fn signed_request(payload: Vec<u8>, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/stripe");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(payload)).unwrap()
    }

    fn now() -> i64 {
        FixedClock::default().now().timestamp()
    }

    async fn status_and_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_signed_completion_is_fulfilled() {
        // Arrange
        let seller = user_fixture("Bruno");
        let buyer = user_fixture("Ana");
        let listing = listing_fixture(seller.id, 89_900);
        let store = Arc::new(
            InMemoryMarketplace::new()
                .with_user(seller.clone())
                .with_user(buyer.clone())
                .with_listing(listing.clone()),
        );
        let app = router().with_state(state_with(store.clone()));
        let payload = completed_event(listing.id, seller.id, buyer.id);
        let signature = sign_payload(&payload, WEBHOOK_SECRET, now());

        // Act
        let (status, json) = status_and_json(app, signed_request(payload, Some(signature))).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["received"], true);
        let sold = store.listing(listing.id).unwrap();
        assert!(sold.sold && sold.paid);
        assert_eq!(sold.buyer_id, Some(buyer.id));
        assert_eq!(store.ledger_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_signature_returns_400() {
        let app = router().with_state(state_with(Arc::new(InMemoryMarketplace::new())));

        let (status, json) = status_and_json(app, signed_request(b"{}".to_vec(), None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_bad_signature_returns_400_and_writes_nothing() {
        let seller = user_fixture("Bruno");
        let buyer = user_fixture("Ana");
        let listing = listing_fixture(seller.id, 89_900);
        let store = Arc::new(
            InMemoryMarketplace::new()
                .with_user(seller.clone())
                .with_user(buyer.clone())
                .with_listing(listing.clone()),
        );
        let app = router().with_state(state_with(store.clone()));
        let payload = completed_event(listing.id, seller.id, buyer.id);
        let signature = sign_payload(&payload, "whsec_attacker", now());

        let (status, _) = status_and_json(app, signed_request(payload, Some(signature))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.ledger_entries().is_empty());
        assert!(!store.listing(listing.id).unwrap().sold);
    }

    #[tokio::test]
    async fn test_unparseable_body_returns_400() {
        let app = router().with_state(state_with(Arc::new(InMemoryMarketplace::new())));
        let payload = b"not json".to_vec();
        let signature = sign_payload(&payload, WEBHOOK_SECRET, now());

        let (status, _) = status_and_json(app, signed_request(payload, Some(signature))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unconfigured_secret_returns_500() {
        let mut state = state_with(Arc::new(InMemoryMarketplace::new()));
        state.webhook = Arc::new(crate::state::WebhookSettings::default());
        let app = router().with_state(state);
        let payload = b"{}".to_vec();
        let signature = sign_payload(&payload, WEBHOOK_SECRET, now());

        let (status, _) = status_and_json(app, signed_request(payload, Some(signature))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unhandled_event_type_is_acknowledged() {
        let app = router().with_state(state_with(Arc::new(InMemoryMarketplace::new())));
        let payload = serde_json::to_vec(&json!({
            "id": "evt_2",
            "type": "customer.created",
            "data": { "object": { "id": "cus_1" } }
        }))
        .unwrap();
        let signature = sign_payload(&payload, WEBHOOK_SECRET, now());

        let (status, json) = status_and_json(app, signed_request(payload, Some(signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["received"], true);
    }

    #[tokio::test]
    async fn test_storage_outage_returns_500_for_redelivery() {
        let mut state = state_with(Arc::new(InMemoryMarketplace::new()));
        state.listings = Arc::new(FailingRepository);
        let app = router().with_state(state);
        let payload = completed_event(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
        let signature = sign_payload(&payload, WEBHOOK_SECRET, now());

        let (status, json) = status_and_json(app, signed_request(payload, Some(signature))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
