//! Document storage port.

use async_trait::async_trait;

use crate::error::DomainError;

/// Port to durable document storage (invoices).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `content` under `name` and returns its public URL.
    async fn store(
        &self,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<String, DomainError>;
}
