//! HTTP-backed collaborators for the Updraft check engine.
//!
//! - [`HttpFeedSource`] downloads the appcast with reqwest.
//! - [`JsonFeedParser`] reads the JSON appcast format.
//! - [`HttpCompatibilitySource`] asks the paired server for its version.

mod client;
mod compatibility;
mod error;
mod feed;
mod parser;

pub use client::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpConfig};
pub use compatibility::{
    DEFAULT_LEGACY_SERVER_VERSION, DEFAULT_VERSION_KEY, HttpCompatibilitySource,
};
pub use error::CompatibilityError;
pub use feed::HttpFeedSource;
pub use parser::JsonFeedParser;
