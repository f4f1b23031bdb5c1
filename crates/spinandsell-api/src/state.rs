//! Shared application state.

use std::sync::Arc;

use spinandsell_checkout::application::CheckoutServices;
use spinandsell_checkout::domain::settings::CheckoutSettings;
use spinandsell_core::clock::Clock;
use spinandsell_core::mail::Mailer;
use spinandsell_core::payment::PaymentProvider;
use spinandsell_core::repository::{
    FavoriteRepository, LedgerRepository, ListingRepository, ThreadRepository, UserRepository,
};
use spinandsell_core::storage::DocumentStore;

/// Stripe webhook endpoint settings.
#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    /// Endpoint signing secret. Without it every delivery is rejected.
    pub secret: Option<String>,
    pub tolerance_secs: i64,
}

/// External providers used by the handlers.
#[derive(Clone)]
pub struct Providers {
    pub payments: Arc<dyn PaymentProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub mailer: Arc<dyn Mailer>,
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<CheckoutSettings>,
    pub webhook: Arc<WebhookSettings>,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<dyn UserRepository>,
    pub listings: Arc<dyn ListingRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub threads: Arc<dyn ThreadRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub payments: Arc<dyn PaymentProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create new application state with every repository served by `store`.
    #[must_use]
    pub fn new<S>(
        store: Arc<S>,
        providers: Providers,
        settings: CheckoutSettings,
        webhook: WebhookSettings,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        S: UserRepository
            + ListingRepository
            + LedgerRepository
            + ThreadRepository
            + FavoriteRepository
            + 'static,
    {
        Self {
            settings: Arc::new(settings),
            webhook: Arc::new(webhook),
            clock,
            users: store.clone(),
            listings: store.clone(),
            ledger: store.clone(),
            threads: store.clone(),
            favorites: store,
            payments: providers.payments,
            documents: providers.documents,
            mailer: providers.mailer,
        }
    }

    /// Borrows the collaborators of the checkout handlers.
    #[must_use]
    pub fn services(&self) -> CheckoutServices<'_> {
        CheckoutServices {
            settings: &self.settings,
            clock: self.clock.as_ref(),
            users: self.users.as_ref(),
            listings: self.listings.as_ref(),
            ledger: self.ledger.as_ref(),
            threads: self.threads.as_ref(),
            payments: self.payments.as_ref(),
            documents: self.documents.as_ref(),
            mailer: self.mailer.as_ref(),
        }
    }
}
