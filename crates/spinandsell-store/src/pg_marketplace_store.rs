//! `PostgreSQL` implementation of the marketplace repository traits.

use sqlx::PgPool;

/// PostgreSQL-backed marketplace store.
///
/// Implements `UserRepository`, `ListingRepository`, `LedgerRepository`,
/// `ThreadRepository` and `FavoriteRepository`. Multi-row writes run inside
/// a single transaction.
#[derive(Debug, Clone)]
pub struct PgMarketplaceStore {
    pub(crate) pool: PgPool,
}

impl PgMarketplaceStore {
    /// Creates a new `PgMarketplaceStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
