//! Integration tests for listings and favorites.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use spinandsell_test_support::user_fixture;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "../../migrations")]
async fn test_listing_create_view_delete_round_trip(pool: PgPool) {
    let seller = user_fixture("Bruno");
    common::insert_user(&pool, &seller).await;

    // POST /api/v1/listings
    let (app, _) = common::build_test_app(pool.clone());
    let (status, json) = common::send_json(
        app,
        "POST",
        "/api/v1/listings",
        Some(seller.id),
        Some(&json!({
            "brand": "Xiaomi",
            "model": "Pro 2",
            "year": 2022,
            "category": "ELECTRIC_SCOOTER",
            "condition": "C",
            "price": 25_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let listing_id = json["id"].as_str().unwrap().to_owned();

    // GET twice from the same address, once from another.
    let uri = format!("/api/v1/listings/{listing_id}");
    for addr in ["198.51.100.7", "198.51.100.7", "198.51.100.8"] {
        let (app, _) = common::build_test_app(pool.clone());
        let request = axum::http::Request::builder()
            .uri(&uri)
            .header("x-forwarded-for", addr)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let (app, _) = common::build_test_app(pool.clone());
    let (_, json) = common::get_json(app, &uri, Some(seller.id)).await;
    assert_eq!(json["views"], 3);
    assert_eq!(json["seller"]["id"], seller.id.to_string());

    // DELETE
    let (app, _) = common::build_test_app(pool.clone());
    let (status, _) = common::send_json(app, "DELETE", &uri, Some(seller.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (app, _) = common::build_test_app(pool);
    let (status, json) = common::get_json(app, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_listing_without_identity_returns_401(pool: PgPool) {
    let (app, _) = common::build_test_app(pool);

    let (status, json) = common::send_json(
        app,
        "POST",
        "/api/v1/listings",
        None,
        Some(&json!({
            "brand": "Orbea", "model": "Orca", "year": 2021,
            "category": "ROAD_BIKE", "condition": "A", "price": 100
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_favorites_keep_like_counter_consistent(pool: PgPool) {
    let (buyer, _seller, listing) = common::seed_sale(&pool, 50_000).await;
    let body = json!({ "productId": listing.id });

    let (app, _) = common::build_test_app(pool.clone());
    let (status, _) = common::send_json(app, "POST", "/api/v1/favorites", Some(buyer.id), Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (app, _) = common::build_test_app(pool.clone());
    let (status, json) = common::send_json(app, "POST", "/api/v1/favorites", Some(buyer.id), Some(&body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");

    let (app, _) = common::build_test_app(pool.clone());
    let (status, json) = common::get_json(app, "/api/v1/favorites", Some(buyer.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["listing"]["likes"], 1);

    let (app, _) = common::build_test_app(pool.clone());
    let (status, _) = common::send_json(
        app,
        "DELETE",
        &format!("/api/v1/favorites/{}", listing.id),
        Some(buyer.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (likes, rows): (i64, i64) = sqlx::query_as(
        "SELECT l.likes, (SELECT COUNT(*) FROM favorites f WHERE f.listing_id = l.id) FROM listings l WHERE l.id = $1",
    )
    .bind(listing.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!((likes, rows), (0, 0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_removing_absent_favorite_returns_404(pool: PgPool) {
    let buyer = user_fixture("Ana");
    common::insert_user(&pool, &buyer).await;

    let (app, _) = common::build_test_app(pool);
    let (status, _) = common::send_json(
        app,
        "DELETE",
        &format!("/api/v1/favorites/{}", Uuid::new_v4()),
        Some(buyer.id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_search_filters_sorts_and_clamps_page_size(pool: PgPool) {
    // Arrange
    let (_, seller, orbea) = common::seed_sale(&pool, 89_900).await;
    for (brand, price) in [("Trek", 40_000), ("Trek", 120_000)] {
        let (app, _) = common::build_test_app(pool.clone());
        let (status, _) = common::send_json(
            app,
            "POST",
            "/api/v1/listings",
            Some(seller.id),
            Some(&json!({
                "brand": brand, "model": "Marlin", "year": 2022,
                "category": "MOUNTAIN_BIKE", "condition": "B", "price": price
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Act
    let (app, _) = common::build_test_app(pool.clone());
    let (status, trek) = common::get_json(
        app,
        "/api/v1/listings?category=MOUNTAIN_BIKE&brand=trek&sortBy=price-asc",
        None,
    )
    .await;
    let (app, _) = common::build_test_app(pool.clone());
    let (_, clamped) = common::get_json(app, "/api/v1/listings?limit=500", None).await;
    let (app, _) = common::build_test_app(pool.clone());
    let (_, beyond) = common::get_json(app, "/api/v1/listings?page=9&limit=2", None).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<i64> = trek["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![40_000, 120_000]);
    assert_eq!(clamped["pagination"]["limit"], 50);
    assert_eq!(clamped["pagination"]["total"], 3);
    assert!(
        clamped["products"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["id"] == orbea.id.to_string())
    );
    assert!(beyond["products"].as_array().unwrap().is_empty());
    assert_eq!(beyond["pagination"]["total"], 3);
    assert_eq!(beyond["pagination"]["hasMore"], false);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_withdrawn_listing_leaves_search_but_stays_in_my_listings(pool: PgPool) {
    // Arrange
    let (_, seller, listing) = common::seed_sale(&pool, 89_900).await;

    // Act
    let (app, _) = common::build_test_app(pool.clone());
    let (status, json) = common::send_json(
        app,
        "PUT",
        &format!("/api/v1/listings/{}/status", listing.id),
        Some(seller.id),
        Some(&json!({ "available": false })),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["withdrawn"], true);
    let (app, _) = common::build_test_app(pool.clone());
    let (_, search) = common::get_json(app, "/api/v1/listings", None).await;
    assert_eq!(search["pagination"]["total"], 0);
    let (app, _) = common::build_test_app(pool);
    let (_, mine) = common::get_json(app, "/api/v1/listings/mine", Some(seller.id)).await;
    assert_eq!(mine[0]["id"], listing.id.to_string());
    assert_eq!(mine[0]["withdrawn"], true);
}
