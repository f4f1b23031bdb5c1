//! Catalogue domain: commands, listing rules, search criteria and viewer
//! identity.

pub mod commands;
pub mod listing_rules;
pub mod search;
pub mod viewer;
