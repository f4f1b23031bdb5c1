//! Messaging domain: commands and content rules.

pub mod commands;
pub mod rules;
