//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use spinandsell_checkout::domain::settings::CheckoutSettings;
use spinandsell_core::clock::Clock;
use spinandsell_core::model::{Listing, User};
use spinandsell_core::repository::ListingRepository;
use spinandsell_store::PgMarketplaceStore;
use spinandsell_test_support::{
    FixedClock, RecordingDocumentStore, RecordingMailer, RecordingPaymentProvider,
    listing_fixture, user_fixture,
};
use sqlx::PgPool;
use tower::ServiceExt;

use spinandsell_api::build_router;
use spinandsell_api::extract::USER_ID_HEADER;
use spinandsell_api::state::{AppState, Providers, WebhookSettings};

pub const WEBHOOK_SECRET: &str = "whsec_integration";

/// Recording doubles behind the app, kept for assertions.
pub struct TestProviders {
    pub payments: Arc<RecordingPaymentProvider>,
    pub documents: Arc<RecordingDocumentStore>,
    pub mailer: Arc<RecordingMailer>,
}

/// Unix time of the fixed test clock, for signing webhooks.
pub fn now() -> i64 {
    FixedClock::default().now().timestamp()
}

/// Build the full app router on a real `PgMarketplaceStore` with recording
/// providers and a fixed clock. Uses the same router as `main.rs`.
pub fn build_test_app(pool: PgPool) -> (Router, TestProviders) {
    let providers = TestProviders {
        payments: Arc::new(RecordingPaymentProvider::new()),
        documents: Arc::new(RecordingDocumentStore::new()),
        mailer: Arc::new(RecordingMailer::new()),
    };
    let app_state = AppState::new(
        Arc::new(PgMarketplaceStore::new(pool)),
        Providers {
            payments: providers.payments.clone(),
            documents: providers.documents.clone(),
            mailer: providers.mailer.clone(),
        },
        CheckoutSettings {
            base_url: "https://spinandsell.test".to_owned(),
            ..CheckoutSettings::default()
        },
        WebhookSettings {
            secret: Some(WEBHOOK_SECRET.to_owned()),
            tolerance_secs: 300,
        },
        Arc::new(FixedClock::default()),
    );
    (build_router(app_state), providers)
}

/// Inserts `user` directly; accounts are owned by the auth service.
pub async fn insert_user(pool: &PgPool, user: &User) {
    sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES ($1, $2, $3, $4)")
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(pool)
        .await
        .unwrap();
}

/// Seeds a buyer, a seller and one listing by the seller.
pub async fn seed_sale(pool: &PgPool, price: i64) -> (User, User, Listing) {
    let buyer = user_fixture("Ana");
    let seller = user_fixture("Bruno");
    insert_user(pool, &buyer).await;
    insert_user(pool, &seller).await;
    let listing = listing_fixture(seller.id, price);
    PgMarketplaceStore::new(pool.clone())
        .insert_listing(&listing)
        .await
        .unwrap();
    (buyer, seller, listing)
}

async fn into_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a request with an optional JSON body as `user` and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    user: Option<uuid::Uuid>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    into_json(app, request).await
}

/// Send a GET request as `user` and return the response.
pub async fn get_json(app: Router, uri: &str, user: Option<uuid::Uuid>) -> (StatusCode, serde_json::Value) {
    send_json(app, "GET", uri, user, None).await
}

/// POST a raw webhook body with the given `Stripe-Signature` header.
pub async fn post_webhook(
    app: Router,
    payload: Vec<u8>,
    signature: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/stripe")
        .header("stripe-signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .unwrap();
    into_json(app, request).await
}
