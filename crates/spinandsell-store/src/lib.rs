//! SpinAndSell — PostgreSQL storage.
//!
//! Implements every repository port from `spinandsell-core` on a single
//! connection pool. Schema lives in the workspace `migrations/` directory.

mod error;
mod favorites;
mod ledger;
mod listings;
pub mod pg_marketplace_store;
mod rows;
mod threads;
mod users;

pub use pg_marketplace_store::PgMarketplaceStore;
