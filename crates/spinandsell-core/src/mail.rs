//! Outbound e-mail port.

use async_trait::async_trait;

use crate::error::DomainError;

/// A rendered e-mail ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Port to the e-mail delivery service.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a single e-mail.
    async fn send(&self, email: &OutboundEmail) -> Result<(), DomainError>;
}
