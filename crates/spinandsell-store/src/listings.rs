//! `ListingRepository` for `PgMarketplaceStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinandsell_core::error::DomainError;
use spinandsell_core::model::Listing;
use spinandsell_core::repository::ListingRepository;
use spinandsell_core::search::{ListingPage, ListingQuery, ListingSort};
use uuid::Uuid;

use crate::error::db_error;
use crate::pg_marketplace_store::PgMarketplaceStore;
use crate::rows::ListingRow;

#[async_trait]
impl ListingRepository for PgMarketplaceStore {
    async fn find_listing(&self, listing_id: Uuid) -> Result<Option<Listing>, DomainError> {
        sqlx::query_as::<_, ListingRow>("SELECT * FROM listings WHERE id = $1")
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Listing::try_from)
            .transpose()
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO listings (id, seller_id, buyer_id, brand, model, year, category, \
             condition, description, images, price, sold, paid, views, likes, created_at, sold_at, \
             withdrawn) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(listing.id)
        .bind(listing.seller_id)
        .bind(listing.buyer_id)
        .bind(&listing.brand)
        .bind(&listing.model)
        .bind(listing.year)
        .bind(listing.category.as_str())
        .bind(listing.condition.as_str())
        .bind(&listing.description)
        .bind(&listing.images)
        .bind(listing.price)
        .bind(listing.sold)
        .bind(listing.paid)
        .bind(listing.views)
        .bind(listing.likes)
        .bind(listing.created_at)
        .bind(listing.sold_at)
        .bind(listing.withdrawn)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn delete_listing(&self, listing_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1 AND sold = FALSE")
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn search_listings(&self, query: &ListingQuery) -> Result<ListingPage, DomainError> {
        let filters = SearchFilters::from(query);

        let count_sql = format!("SELECT COUNT(*) FROM listings {SEARCH_WHERE}");
        let page_sql = format!(
            "SELECT * FROM listings {SEARCH_WHERE} ORDER BY {} LIMIT $7 OFFSET $8",
            order_by(query.sort)
        );

        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filters.category)
            .bind(filters.condition)
            .bind(filters.brand.as_deref())
            .bind(filters.min_price)
            .bind(filters.max_price)
            .bind(filters.search.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let rows = sqlx::query_as::<_, ListingRow>(&page_sql)
            .bind(filters.category)
            .bind(filters.condition)
            .bind(filters.brand.as_deref())
            .bind(filters.min_price)
            .bind(filters.max_price)
            .bind(filters.search.as_deref())
            .bind(i64::from(query.limit))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(ListingPage {
            listings: rows
                .into_iter()
                .map(Listing::try_from)
                .collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn list_seller_listings(&self, seller_id: Uuid) -> Result<Vec<Listing>, DomainError> {
        sqlx::query_as::<_, ListingRow>(
            "SELECT * FROM listings WHERE seller_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(Listing::try_from)
        .collect()
    }

    async fn set_withdrawn(
        &self,
        listing_id: Uuid,
        withdrawn: bool,
    ) -> Result<Option<Listing>, DomainError> {
        sqlx::query_as::<_, ListingRow>(
            "UPDATE listings SET withdrawn = $2 WHERE id = $1 AND sold = FALSE RETURNING *",
        )
        .bind(listing_id)
        .bind(withdrawn)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Listing::try_from)
        .transpose()
    }

    async fn record_view(
        &self,
        listing_id: Uuid,
        viewer_key: &str,
        viewed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let inserted = sqlx::query(
            "INSERT INTO listing_views (viewer_key, listing_id, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (viewer_key, listing_id) DO NOTHING",
        )
        .bind(viewer_key)
        .bind(listing_id)
        .bind(viewed_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected()
            == 1;

        if inserted {
            sqlx::query("UPDATE listings SET views = views + 1 WHERE id = $1")
                .bind(listing_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(inserted)
    }
}

/// Filters for `search_listings`; every parameter is optional.
const SEARCH_WHERE: &str = "WHERE sold = FALSE AND withdrawn = FALSE \
     AND ($1::text IS NULL OR category = $1) \
     AND ($2::text IS NULL OR condition = $2) \
     AND ($3::text IS NULL OR brand ILIKE $3) \
     AND ($4::bigint IS NULL OR price >= $4) \
     AND ($5::bigint IS NULL OR price <= $5) \
     AND ($6::text IS NULL OR brand ILIKE $6 OR model ILIKE $6 OR description ILIKE $6)";

/// Bind values for [`SEARCH_WHERE`].
struct SearchFilters {
    category: Option<&'static str>,
    condition: Option<&'static str>,
    brand: Option<String>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    search: Option<String>,
}

impl From<&ListingQuery> for SearchFilters {
    fn from(query: &ListingQuery) -> Self {
        Self {
            category: query.category.map(|c| c.as_str()),
            condition: query.condition.map(|c| c.as_str()),
            brand: query.brand.as_deref().map(contains_pattern),
            min_price: query.min_price,
            max_price: query.max_price,
            search: query.search.as_deref().map(contains_pattern),
        }
    }
}

fn order_by(sort: ListingSort) -> &'static str {
    match sort {
        ListingSort::Newest => "created_at DESC, id",
        ListingSort::Oldest => "created_at ASC, id",
        ListingSort::PriceAsc => "price ASC, created_at DESC, id",
        ListingSort::PriceDesc => "price DESC, created_at DESC, id",
        ListingSort::Popular => "likes DESC, created_at DESC, id",
        ListingSort::MostViewed => "views DESC, created_at DESC, id",
    }
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` taken
/// literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
