//! Stripe Checkout client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use spinandsell_core::error::DomainError;
use spinandsell_core::payment::{
    CheckoutSessionRequest, HostedSession, PaymentProvider, ProviderSession,
};

const PROVIDER: &str = "stripe";

/// API version pinned on every request.
pub const STRIPE_API_VERSION: &str = "2025-05-28.basil";

/// Public Stripe API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Hosted checkout backed by the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    /// Creates a client for `api_base` authenticated with `secret_key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ExternalProvider` when the HTTP client cannot be
    /// built.
    pub fn new(secret_key: impl Into<String>, api_base: &str) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;

        Ok(Self {
            client,
            secret_key: secret_key.into(),
            api_base: api_base.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionList {
    data: Vec<ProviderSession>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Flattens a checkout request into Stripe's bracketed form encoding.
pub(crate) fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let item = &request.line_item;
    let mut form = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("payment_method_types[0]".to_owned(), "card".to_owned()),
        (
            "line_items[0][price_data][currency]".to_owned(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_owned(),
            item.unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_owned(),
            item.name.clone(),
        ),
        (
            "line_items[0][quantity]".to_owned(),
            item.quantity.to_string(),
        ),
        ("success_url".to_owned(), request.success_url.clone()),
        ("cancel_url".to_owned(), request.cancel_url.clone()),
    ];

    // Stripe rejects an empty product description.
    if !item.description.trim().is_empty() {
        form.push((
            "line_items[0][price_data][product_data][description]".to_owned(),
            item.description.clone(),
        ));
    }

    for (i, image) in item.images.iter().enumerate() {
        form.push((
            format!("line_items[0][price_data][product_data][images][{i}]"),
            image.clone(),
        ));
    }

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    form
}

/// Reads a successful body or turns a Stripe error envelope into a
/// `DomainError`.
async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, DomainError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;

    if !status.is_success() {
        return Err(DomainError::provider(PROVIDER, error_message(status.as_u16(), &body)));
    }

    serde_json::from_str(&body)
        .map_err(|e| DomainError::provider(PROVIDER, format!("unexpected response: {e}")))
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message: Some(message),
                code,
            },
        }) => match code {
            Some(code) => format!("{message} ({code})"),
            None => message,
        },
        _ => format!("HTTP {status}"),
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<HostedSession, DomainError> {
        let response = self
            .client
            .post(self.url("/v1/checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&session_form(request))
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;

        let created: CreatedSession = read_json(response).await?;
        let url = created.url.ok_or_else(|| {
            DomainError::provider(PROVIDER, format!("session {} has no checkout url", created.id))
        })?;

        tracing::info!(session_id = %created.id, "stripe checkout session created");
        Ok(HostedSession {
            id: created.id,
            url,
        })
    }

    async fn find_session_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<ProviderSession>, DomainError> {
        let response = self
            .client
            .get(self.url("/v1/checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .query(&[("payment_intent", payment_intent_id), ("limit", "1")])
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;

        let list: SessionList = read_json(response).await?;
        Ok(list.data.into_iter().next())
    }
}
