//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Bad input shape or value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The entity exists but is in a state that forbids the operation
    /// (already sold, self-purchase).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `listing`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The caller is not authenticated.
    #[error("authentication required")]
    Unauthorized,

    /// The caller is authenticated but not entitled to the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The state was already mutated (double favorite, double-sold listing).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A payment, storage or e-mail provider call failed.
    #[error("{provider} error: {message}")]
    ExternalProvider {
        /// Provider name, e.g. `stripe`.
        provider: &'static str,
        /// Provider error detail.
        message: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for an `ExternalProvider` error.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalProvider {
            provider,
            message: message.into(),
        }
    }
}
