//! Routes for the Catalogue bounded context: favorites.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::delete, routing::get};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use spinandsell_catalog::application::{command_handlers, query_handlers};
use spinandsell_catalog::domain::commands::{AddFavorite, RemoveFavorite};
use spinandsell_core::model::{Favorite, FavoriteWithListing};

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

/// Request body for POST /favorites.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub product_id: Uuid,
}

/// GET /favorites
#[instrument(skip(state), fields(user_id = %user))]
async fn list_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<FavoriteWithListing>>, ApiError> {
    let favorites = query_handlers::list_favorites(user, state.favorites.as_ref()).await?;
    Ok(Json(favorites))
}

/// POST /favorites
#[instrument(skip(state, request), fields(user_id = %user, product_id = %request.product_id))]
async fn add_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let command = AddFavorite {
        correlation_id: Uuid::new_v4(),
        user_id: user,
        listing_id: request.product_id,
    };

    let favorite = command_handlers::handle_add_favorite(
        &command,
        state.clock.as_ref(),
        state.listings.as_ref(),
        state.favorites.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

/// DELETE /favorites/{product_id}
#[instrument(skip(state), fields(user_id = %user))]
async fn remove_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = RemoveFavorite {
        correlation_id: Uuid::new_v4(),
        user_id: user,
        listing_id: product_id,
    };

    command_handlers::handle_remove_favorite(&command, state.favorites.as_ref()).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for favorites.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/{product_id}", delete(remove_favorite))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use spinandsell_test_support::{InMemoryMarketplace, listing_fixture, user_fixture};

    use super::*;
    use crate::routes::testing::{send, state_with};

    #[tokio::test]
    async fn test_favorite_lifecycle_keeps_counter_in_step() {
        // Arrange
        let seller = user_fixture("Bruno");
        let fan = user_fixture("Ana");
        let listing = listing_fixture(seller.id, 50_000);
        let store = Arc::new(
            InMemoryMarketplace::new()
                .with_user(seller)
                .with_user(fan.clone())
                .with_listing(listing.clone()),
        );
        let state = state_with(store.clone());
        let body = json!({ "productId": listing.id });

        // Act
        let (added, _) = send(router().with_state(state.clone()), "POST", "/", Some(fan.id), Some(body.clone())).await;
        let (duplicate, dup_json) = send(router().with_state(state.clone()), "POST", "/", Some(fan.id), Some(body)).await;
        let (_, listed) = send(router().with_state(state.clone()), "GET", "/", Some(fan.id), None).await;

        // Assert
        assert_eq!(added, StatusCode::CREATED);
        assert_eq!(duplicate, StatusCode::CONFLICT);
        assert_eq!(dup_json["error"], "conflict");
        assert_eq!(store.listing(listing.id).unwrap().likes, 1);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["listing"]["id"], listing.id.to_string());

        let (removed, _) = send(
            router().with_state(state.clone()),
            "DELETE",
            &format!("/{}", listing.id),
            Some(fan.id),
            None,
        )
        .await;
        let (again, _) = send(
            router().with_state(state),
            "DELETE",
            &format!("/{}", listing.id),
            Some(fan.id),
            None,
        )
        .await;
        assert_eq!(removed, StatusCode::NO_CONTENT);
        assert_eq!(again, StatusCode::NOT_FOUND);
        assert_eq!(store.listing(listing.id).unwrap().likes, 0);
        assert_eq!(store.favorite_count(listing.id), 0);
    }

    #[tokio::test]
    async fn test_favorite_of_unknown_listing_returns_404() {
        let fan = user_fixture("Ana");
        let store = Arc::new(InMemoryMarketplace::new().with_user(fan.clone()));
        let app = router().with_state(state_with(store));

        let (status, _) = send(
            app,
            "POST",
            "/",
            Some(fan.id),
            Some(json!({ "productId": Uuid::new_v4() })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
