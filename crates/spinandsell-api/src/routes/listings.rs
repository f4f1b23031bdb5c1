//! Routes for the Catalogue bounded context: listings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use spinandsell_catalog::application::{command_handlers, query_handlers};
use spinandsell_catalog::domain::commands::{
    CreateListing, DeleteListing, ListingDraft, SetListingAvailability,
};
use spinandsell_catalog::domain::search::SearchCriteria;
use spinandsell_core::model::Listing;

use crate::error::ApiError;
use crate::extract::{AuthenticatedUser, ViewerIdentity};
use crate::state::AppState;

/// Request body for POST /listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub category: String,
    pub condition: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: i64,
}

impl From<CreateListingRequest> for ListingDraft {
    fn from(request: CreateListingRequest) -> Self {
        Self {
            brand: request.brand,
            model: request.model,
            year: request.year,
            category: request.category,
            condition: request.condition,
            description: request.description,
            images: request.images,
            price: request.price,
        }
    }
}

/// Query string for GET /listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub category: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<SearchParams> for SearchCriteria {
    fn from(params: SearchParams) -> Self {
        Self {
            category: params.category,
            condition: params.condition,
            brand: params.brand,
            min_price: params.min_price,
            max_price: params.max_price,
            search: params.search,
            sort_by: params.sort_by,
            page: params.page,
            limit: params.limit,
        }
    }
}

/// Request body for PUT /listings/{id}/status.
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

/// GET /listings
#[instrument(skip(state))]
async fn search_listings(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<query_handlers::ListingSearchResult>, ApiError> {
    let result = query_handlers::search_listings(
        params.into(),
        state.listings.as_ref(),
        state.users.as_ref(),
    )
    .await?;

    Ok(Json(result))
}

/// GET /listings/mine
#[instrument(skip(state), fields(seller_id = %seller))]
async fn my_listings(
    State(state): State<AppState>,
    AuthenticatedUser(seller): AuthenticatedUser,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let listings = query_handlers::list_seller_listings(seller, state.listings.as_ref()).await?;

    Ok(Json(listings))
}

/// PUT /listings/{id}/status
#[instrument(skip(state, request), fields(requester_id = %requester))]
async fn set_availability(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<Listing>, ApiError> {
    let command = SetListingAvailability {
        correlation_id: Uuid::new_v4(),
        listing_id,
        requester_id: requester,
        available: request.available,
    };

    let listing =
        command_handlers::handle_set_listing_availability(&command, state.listings.as_ref())
            .await?;

    Ok(Json(listing))
}

/// POST /listings
#[instrument(skip(state, request), fields(seller_id = %seller))]
async fn create_listing(
    State(state): State<AppState>,
    AuthenticatedUser(seller): AuthenticatedUser,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let command = CreateListing {
        correlation_id: Uuid::new_v4(),
        seller_id: seller,
        draft: request.into(),
    };

    let listing = command_handlers::handle_create_listing(
        &command,
        state.clock.as_ref(),
        state.users.as_ref(),
        state.listings.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /listings/{id}
#[instrument(skip(state, viewer))]
async fn get_listing(
    State(state): State<AppState>,
    ViewerIdentity(viewer): ViewerIdentity,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<query_handlers::ListingView>, ApiError> {
    let view = query_handlers::view_listing(
        listing_id,
        &viewer,
        state.clock.as_ref(),
        state.listings.as_ref(),
        state.users.as_ref(),
    )
    .await?;

    Ok(Json(view))
}

/// DELETE /listings/{id}
#[instrument(skip(state), fields(requester_id = %requester))]
async fn delete_listing(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = DeleteListing {
        correlation_id: Uuid::new_v4(),
        listing_id,
        requester_id: requester,
    };

    command_handlers::handle_delete_listing(&command, state.listings.as_ref()).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for listings.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_listings).post(create_listing))
        .route("/mine", get(my_listings))
        .route("/{id}", get(get_listing).delete(delete_listing))
        .route("/{id}/status", put(set_availability))
}
