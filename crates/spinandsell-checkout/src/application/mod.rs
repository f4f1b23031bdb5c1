//! Checkout application services.

pub mod checkout;
pub mod fulfillment;
pub mod webhook;

use spinandsell_core::clock::Clock;
use spinandsell_core::mail::Mailer;
use spinandsell_core::payment::PaymentProvider;
use spinandsell_core::repository::{
    LedgerRepository, ListingRepository, ThreadRepository, UserRepository,
};
use spinandsell_core::storage::DocumentStore;

use crate::domain::settings::CheckoutSettings;

/// Collaborators of the checkout and fulfillment handlers.
#[derive(Clone, Copy)]
pub struct CheckoutServices<'a> {
    pub settings: &'a CheckoutSettings,
    pub clock: &'a dyn Clock,
    pub users: &'a dyn UserRepository,
    pub listings: &'a dyn ListingRepository,
    pub ledger: &'a dyn LedgerRepository,
    pub threads: &'a dyn ThreadRepository,
    pub payments: &'a dyn PaymentProvider,
    pub documents: &'a dyn DocumentStore,
    pub mailer: &'a dyn Mailer,
}
