//! Core domain + application logic for the ticket bot.
//!
//! This crate is intentionally framework-agnostic. Slack and Redmine live behind
//! ports (traits) implemented in adapter crates.

pub mod bot;
pub mod commands;
pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod tracker;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
