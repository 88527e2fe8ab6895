//! Core domain + application logic for the channel relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! messaging port (trait) implemented in the adapter crate.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod mode;
pub mod peer_ref;
pub mod registry;
pub mod resolver;
pub mod security;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
