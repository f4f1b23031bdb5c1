//! SpinAndSell Core — shared domain types and ports.
//!
//! This crate defines the records, repository traits and external-provider
//! ports that every marketplace context depends on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod mail;
pub mod model;
pub mod money;
pub mod payment;
pub mod repository;
pub mod search;
pub mod storage;
