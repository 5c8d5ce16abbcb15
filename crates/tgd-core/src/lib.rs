//! Outbound Telegram dispatch core.
//!
//! Turns "send this to that chat" into correctly sequenced Bot API calls:
//! recipient normalization, media classification, retries, and the HTML →
//! plain-text fallback. The Bot API itself lives behind [`transport`] traits
//! implemented in adapter crates.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod media;
pub mod recipient;
pub mod transport;

pub use dispatch::Dispatcher;
pub use errors::{Error, Result};
