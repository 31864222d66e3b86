//! Core domain + application logic for the homework review relay.
//!
//! This crate is framework-agnostic. The review API (HTTP) and Telegram live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod poller;
pub mod status;
pub mod verdict;

pub use errors::{Error, Result};
