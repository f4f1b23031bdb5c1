//! Query handlers for the Catalogue context.

use std::collections::HashMap;

use serde::Serialize;
use spinandsell_core::clock::Clock;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{FavoriteWithListing, Listing};
use spinandsell_core::repository::{FavoriteRepository, ListingRepository, UserRepository};
use uuid::Uuid;

use crate::domain::search::SearchCriteria;
use crate::domain::viewer::Viewer;

/// Public seller summary shown with a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerView {
    pub id: Uuid,
    pub name: Option<String>,
}

/// A listing with its seller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub seller: Option<SellerView>,
}

/// Loads a listing for display, counting the view once per viewer.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the listing does not exist.
pub async fn view_listing(
    listing_id: Uuid,
    viewer: &Viewer,
    clock: &dyn Clock,
    listings: &dyn ListingRepository,
    users: &dyn UserRepository,
) -> Result<ListingView, DomainError> {
    let mut listing = listings
        .find_listing(listing_id)
        .await?
        .ok_or_else(|| DomainError::not_found("listing", listing_id))?;

    if let Some(key) = viewer.dedup_key() {
        if listings.record_view(listing_id, &key, clock.now()).await? {
            listing.views += 1;
        }
    }

    let seller = users.find_user(listing.seller_id).await?.map(|u| SellerView {
        id: u.id,
        name: u.name,
    });
    Ok(ListingView { listing, seller })
}

/// Paging metadata for a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    pub has_more: bool,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit_wide),
            has_more: u64::from(page) * limit_wide < total,
        }
    }
}

/// One page of listings on the market.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchResult {
    pub products: Vec<ListingView>,
    pub pagination: Pagination,
}

/// Searches listings on the market. Sold and withdrawn listings never appear.
///
/// # Errors
///
/// Returns `DomainError::Validation` for malformed criteria.
pub async fn search_listings(
    criteria: SearchCriteria,
    listings: &dyn ListingRepository,
    users: &dyn UserRepository,
) -> Result<ListingSearchResult, DomainError> {
    let query = criteria.into_query()?;
    let page = listings.search_listings(&query).await?;

    let mut sellers: HashMap<Uuid, Option<SellerView>> = HashMap::new();
    let mut products = Vec::with_capacity(page.listings.len());
    for listing in page.listings {
        let seller = match sellers.get(&listing.seller_id) {
            Some(seller) => seller.clone(),
            None => {
                let seller = users.find_user(listing.seller_id).await?.map(|u| SellerView {
                    id: u.id,
                    name: u.name,
                });
                sellers.insert(listing.seller_id, seller.clone());
                seller
            }
        };
        products.push(ListingView { listing, seller });
    }

    Ok(ListingSearchResult {
        products,
        pagination: Pagination::new(query.page, query.limit, page.total),
    })
}

/// Lists every listing a seller has published, sold and withdrawn included,
/// newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lookup fails.
pub async fn list_seller_listings(
    seller_id: Uuid,
    listings: &dyn ListingRepository,
) -> Result<Vec<Listing>, DomainError> {
    listings.list_seller_listings(seller_id).await
}

/// Lists a user's favorites, newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lookup fails.
pub async fn list_favorites(
    user_id: Uuid,
    favorites: &dyn FavoriteRepository,
) -> Result<Vec<FavoriteWithListing>, DomainError> {
    favorites.list_favorites(user_id).await
}
