//! `FavoriteRepository` for `PgMarketplaceStore`.

use async_trait::async_trait;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{Favorite, FavoriteWithListing};
use spinandsell_core::repository::FavoriteRepository;
use uuid::Uuid;

use crate::error::{db_error, is_foreign_key_violation, is_unique_violation, violated_constraint};
use crate::pg_marketplace_store::PgMarketplaceStore;
use crate::rows::FavoriteListingRow;

#[async_trait]
impl FavoriteRepository for PgMarketplaceStore {
    async fn add_favorite(&self, favorite: &Favorite) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let inserted = sqlx::query(
            "INSERT INTO favorites (id, user_id, listing_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(favorite.id)
        .bind(favorite.user_id)
        .bind(favorite.listing_id)
        .bind(favorite.created_at)
        .execute(&mut *tx)
        .await;
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(DomainError::Conflict(
                    "listing is already a favorite".to_owned(),
                ));
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(
                    if violated_constraint(&err) == Some("favorites_user_id_fkey") {
                        DomainError::not_found("user", favorite.user_id)
                    } else {
                        DomainError::not_found("listing", favorite.listing_id)
                    },
                );
            }
            Err(err) => return Err(db_error(err)),
        }

        sqlx::query("UPDATE listings SET likes = likes + 1 WHERE id = $1")
            .bind(favorite.listing_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected()
            == 1;
        if removed {
            sqlx::query("UPDATE listings SET likes = GREATEST(likes - 1, 0) WHERE id = $1")
                .bind(listing_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(removed)
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FavoriteWithListing>, DomainError> {
        sqlx::query_as::<_, FavoriteListingRow>(
            "SELECT f.id AS favorite_id, f.user_id AS favorite_user_id, \
                    f.created_at AS favorited_at, l.* \
             FROM favorites f JOIN listings l ON l.id = f.listing_id \
             WHERE f.user_id = $1 \
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(FavoriteWithListing::try_from)
        .collect()
    }
}
