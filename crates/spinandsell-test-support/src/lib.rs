//! Shared test doubles and fixtures for the SpinAndSell marketplace.

mod clock;
mod fixtures;
mod providers;
mod repository;

pub use clock::FixedClock;
pub use fixtures::{listing_fixture, user_fixture};
pub use providers::{
    FailingDocumentStore, FailingMailer, FailingPaymentProvider, RecordingDocumentStore,
    RecordingMailer, RecordingPaymentProvider,
};
pub use repository::{FailingRepository, InMemoryMarketplace};
