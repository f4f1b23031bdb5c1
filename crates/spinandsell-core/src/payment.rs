//! Payment provider port.
//!
//! The provider hosts the checkout page. The only context that survives from
//! session creation to the completion webhook is the string metadata attached
//! to the session.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::DomainError;
use crate::money::MinorUnits;

/// A single line item on a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub unit_amount: MinorUnits,
    pub quantity: u32,
}

/// Request for a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub line_item: LineItem,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

/// A session created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSession {
    /// Provider session id.
    pub id: String,
    /// URL of the hosted checkout page.
    pub url: String,
}

/// A checkout session as reported by the provider, either inside a webhook
/// event or from a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderSession {
    pub id: String,
    #[serde(rename = "payment_intent", default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub amount_total: Option<MinorUnits>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Port to the hosted payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<HostedSession, DomainError>;

    /// Finds the checkout session that created `payment_intent_id`.
    async fn find_session_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<ProviderSession>, DomainError>;
}
