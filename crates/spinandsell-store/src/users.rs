//! `UserRepository` for `PgMarketplaceStore`.

use async_trait::async_trait;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::User;
use spinandsell_core::repository::UserRepository;
use uuid::Uuid;

use crate::error::db_error;
use crate::pg_marketplace_store::PgMarketplaceStore;
use crate::rows::UserRow;

#[async_trait]
impl UserRepository for PgMarketplaceStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(User::from))
    }
}
