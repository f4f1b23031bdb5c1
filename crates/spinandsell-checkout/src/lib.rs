//! SpinAndSell — Checkout & Fulfillment bounded context.
//!
//! Creates hosted payment sessions, interprets the provider's payment events
//! and runs the post-payment fulfillment workflow: ledger entry, listing
//! sold transition, invoice, notifications and the buyer/seller thread.

pub mod application;
pub mod domain;
