//! SpinAndSell — Messaging bounded context.
//!
//! Two-party threads, optionally scoped to a listing, and the messages
//! exchanged inside them.

pub mod application;
pub mod domain;
