//! SpinAndSell — external provider adapters.
//!
//! Production implementations of the payment, e-mail and document storage
//! ports, plus Stripe webhook signature verification.

pub mod mailer;
pub mod signature;
pub mod storage;
pub mod stripe;

pub use mailer::{SmtpMailer, SmtpSettings};
pub use storage::FsDocumentStore;
pub use stripe::StripeClient;
