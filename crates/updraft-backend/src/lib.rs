//! Collaborator contracts for the update checker.
//!
//! The decision core in `updraft-core` never performs I/O directly. It talks to
//! the outside world through the traits defined here:
//! - [`FeedSource`] downloads the raw release feed.
//! - [`FeedParser`] turns feed bytes into [`ReleaseCandidate`] records.
//! - [`CompatibilitySource`] resolves the deployed server version.
//! - [`SettingsStore`] reads and writes persisted checker settings.

mod error;
mod traits;
mod types;

pub use error::{DownloadError, FeedParseError, SettingsError};
pub use traits::{CompatibilitySource, FeedParser, FeedSource, SettingsStore};
pub use types::{DownloadOptions, HttpHeaders, ReleaseCandidate};
