//! Test providers — recording and failing doubles for the payment, e-mail
//! and document-storage ports.

use std::sync::Mutex;

use async_trait::async_trait;
use spinandsell_core::error::DomainError;
use spinandsell_core::mail::{Mailer, OutboundEmail};
use spinandsell_core::payment::{
    CheckoutSessionRequest, HostedSession, PaymentProvider, ProviderSession,
};
use spinandsell_core::storage::DocumentStore;

/// A payment provider that records every session request and answers
/// lookups from a preconfigured session.
#[derive(Debug, Default)]
pub struct RecordingPaymentProvider {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
    lookup: Mutex<Option<ProviderSession>>,
}

impl RecordingPaymentProvider {
    /// Creates a provider with no lookup result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session returned by `find_session_by_payment_intent`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_lookup(self, session: ProviderSession) -> Self {
        *self.lookup.lock().unwrap() = Some(session);
        self
    }

    /// Returns a snapshot of every recorded session request.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for RecordingPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<HostedSession, DomainError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("cs_test_{}", requests.len());
        Ok(HostedSession {
            url: format!("https://checkout.example.com/pay/{id}"),
            id,
        })
    }

    async fn find_session_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<ProviderSession>, DomainError> {
        let lookup = self.lookup.lock().unwrap();
        Ok(lookup
            .as_ref()
            .filter(|s| s.payment_intent_id.as_deref() == Some(payment_intent_id))
            .cloned())
    }
}

/// A payment provider whose every call fails.
#[derive(Debug)]
pub struct FailingPaymentProvider;

#[async_trait]
impl PaymentProvider for FailingPaymentProvider {
    async fn create_checkout_session(
        &self,
        _request: &CheckoutSessionRequest,
    ) -> Result<HostedSession, DomainError> {
        Err(DomainError::provider("stripe", "api unavailable"))
    }

    async fn find_session_by_payment_intent(
        &self,
        _payment_intent_id: &str,
    ) -> Result<Option<ProviderSession>, DomainError> {
        Err(DomainError::provider("stripe", "api unavailable"))
    }
}

/// A mailer that records every e-mail instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    /// Creates an empty mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded e-mail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A mailer whose every delivery fails.
#[derive(Debug)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutboundEmail) -> Result<(), DomainError> {
        Err(DomainError::provider("smtp", "connection reset"))
    }
}

/// A document store that keeps documents in memory and returns
/// `https://docs.example.com/<name>` URLs.
#[derive(Debug, Default)]
pub struct RecordingDocumentStore {
    stored: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl RecordingDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of `(name, content_type, content)` triples.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored(&self) -> Vec<(String, String, Vec<u8>)> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingDocumentStore {
    async fn store(
        &self,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<String, DomainError> {
        self.stored
            .lock()
            .unwrap()
            .push((name.to_owned(), content_type.to_owned(), content));
        Ok(format!("https://docs.example.com/{name}"))
    }
}

/// A document store whose every write fails.
#[derive(Debug)]
pub struct FailingDocumentStore;

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn store(
        &self,
        _name: &str,
        _content_type: &str,
        _content: Vec<u8>,
    ) -> Result<String, DomainError> {
        Err(DomainError::provider("storage", "bucket unavailable"))
    }
}
