//! SpinAndSell — Catalogue bounded context.
//!
//! Responsible for publishing and removing listings, de-duplicated view
//! counting, and the favorite relation with its denormalized like counter.

pub mod application;
pub mod domain;
