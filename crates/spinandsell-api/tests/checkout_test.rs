//! Integration tests for checkout and the Stripe webhook.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use spinandsell_providers::signature::sign_payload;
use spinandsell_test_support::user_fixture;
use sqlx::PgPool;
use uuid::Uuid;

fn completed_event(session_id: &str, metadata: &serde_json::Value, amount_total: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": session_id,
            "payment_intent": "pi_integration",
            "amount_total": amount_total,
            "currency": "eur",
            "metadata": metadata
        }}
    }))
    .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_purchase_end_to_end_is_fulfilled_once(pool: PgPool) {
    let (buyer, seller, listing) = common::seed_sale(&pool, 89_900).await;

    // POST /api/v1/checkout
    let (app, providers) = common::build_test_app(pool.clone());
    let (status, json) = common::send_json(
        app,
        "POST",
        "/api/v1/checkout",
        Some(buyer.id),
        Some(&json!({ "productId": listing.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session_id = json["sessionId"].as_str().unwrap().to_owned();

    let request = providers.payments.requests().remove(0);
    assert_eq!(request.metadata["platformFee"], "4495");
    assert_eq!(
        request.success_url,
        format!(
            "https://spinandsell.test/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&product_id={}",
            listing.id
        )
    );
    let metadata = serde_json::to_value(&request.metadata).unwrap();

    // The provider delivers the completion twice.
    let payload = completed_event(&session_id, &metadata, 89_900);
    let signature = sign_payload(&payload, common::WEBHOOK_SECRET, common::now());
    let (app, providers) = common::build_test_app(pool.clone());
    let (status, json) = common::post_webhook(app.clone(), payload.clone(), &signature).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["received"], true);
    let (status, _) = common::post_webhook(app, payload, &signature).await;
    assert_eq!(status, StatusCode::OK);

    // Listing sold to the buyer.
    let (sold, paid, buyer_id): (bool, bool, Option<Uuid>) =
        sqlx::query_as("SELECT sold, paid, buyer_id FROM listings WHERE id = $1")
            .bind(listing.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(sold && paid);
    assert_eq!(buyer_id, Some(buyer.id));

    // Exactly one ledger entry with the invoice attached.
    let rows: Vec<(i64, i64, Option<String>, Option<i64>)> = sqlx::query_as(
        "SELECT amount, platform_fee, invoice_number, tax_amount FROM ledger_entries WHERE payment_session_id = $1",
    )
    .bind(&session_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    let (amount, fee, invoice_number, tax) = rows[0].clone();
    assert_eq!(amount, 89_900);
    assert_eq!(fee, 4_495);
    assert!(invoice_number.unwrap().starts_with("INV-2026-"));
    assert_eq!(tax, Some(17_935));

    // One invoice, two e-mails, one thread with one greeting.
    assert_eq!(providers.documents.stored().len(), 1);
    let sent = providers.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|m| m.to == buyer.email));
    assert!(sent.iter().any(|m| m.to == seller.email));
    let (threads,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM threads WHERE listing_id = $1")
        .bind(listing.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(threads, 1);
    let (messages,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE sender_id = $1")
        .bind(buyer.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(messages, 1);

    // The seller sees the conversation opened by the sale.
    let (app, _) = common::build_test_app(pool.clone());
    let (status, json) = common::get_json(app, "/api/v1/conversations", Some(seller.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["otherParticipant"]["id"], buyer.id.to_string());
    assert_eq!(json[0]["listing"]["sold"], true);
    assert!(json[0]["lastMessage"]["content"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_checkout_of_sold_listing_is_rejected(pool: PgPool) {
    let (buyer, _seller, listing) = common::seed_sale(&pool, 89_900).await;
    sqlx::query("UPDATE listings SET sold = TRUE, paid = TRUE, buyer_id = $2, sold_at = NOW() WHERE id = $1")
        .bind(listing.id)
        .bind(buyer.id)
        .execute(&pool)
        .await
        .unwrap();
    let latecomer = user_fixture("Carla");
    common::insert_user(&pool, &latecomer).await;

    let (app, providers) = common::build_test_app(pool);
    let (status, json) = common::send_json(
        app,
        "POST",
        "/api/v1/checkout",
        Some(latecomer.id),
        Some(&json!({ "productId": listing.id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_state");
    assert!(providers.payments.requests().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_with_forged_signature_changes_nothing(pool: PgPool) {
    let (buyer, seller, listing) = common::seed_sale(&pool, 89_900).await;
    let metadata = json!({
        "productId": listing.id.to_string(),
        "sellerId": seller.id.to_string(),
        "buyerId": buyer.id.to_string(),
        "platformFee": "4495"
    });
    let payload = completed_event("cs_forged", &metadata, 89_900);
    let signature = sign_payload(&payload, "whsec_wrong", common::now());

    let (app, _) = common::build_test_app(pool.clone());
    let (status, json) = common::post_webhook(app, payload, &signature).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ledger_entries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_completion_with_mismatched_seller_is_acknowledged_without_sale(pool: PgPool) {
    let (buyer, _seller, listing) = common::seed_sale(&pool, 89_900).await;
    let metadata = json!({
        "productId": listing.id.to_string(),
        "sellerId": Uuid::new_v4().to_string(),
        "buyerId": buyer.id.to_string()
    });
    let payload = completed_event("cs_mismatch", &metadata, 89_900);
    let signature = sign_payload(&payload, common::WEBHOOK_SECRET, common::now());

    let (app, _) = common::build_test_app(pool.clone());
    let (status, _) = common::post_webhook(app, payload, &signature).await;

    assert_eq!(status, StatusCode::OK);
    let (sold,): (bool,) = sqlx::query_as("SELECT sold FROM listings WHERE id = $1")
        .bind(listing.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!sold);
}
