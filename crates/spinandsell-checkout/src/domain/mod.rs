//! Checkout domain: fee policy, session metadata, payment events, invoices,
//! notification templates and the fulfillment report.

pub mod commands;
pub mod events;
pub mod fees;
pub mod invoice;
pub mod metadata;
pub mod notifications;
pub mod report;
pub mod settings;

mod html;
