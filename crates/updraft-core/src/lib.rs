//! Update-check engine for Updraft.
//!
//! This crate holds the logic that does not depend on a concrete transport or
//! settings backend:
//! - Version string comparison.
//! - The scheme allow-list applied to every URL taken from settings or a feed.
//! - Candidate selection against the current build and server version.
//! - The callback registry the embedding application listens on.
//! - A single check session and the schedulers that drive it.

mod callbacks;
mod error;
mod interval;
mod scheduler;
mod security;
mod select;
mod session;
mod version;

#[cfg(test)]
mod testing;

/// Typed handler slots and the notifications a check dispatches.
pub use callbacks::{
    CallbackRegistry, DownloadProgressHandler, ErrorHandler, EventHandler, EventKind,
    HostQueryHandler, RunInstallerHandler, ShutdownQueryHandler, UpdateFoundHandler,
};
pub use error::{CheckError, ErrorCode};
pub use interval::CheckInterval;
/// Background drivers for check sessions.
pub use scheduler::{
    CyclePlan, DEFAULT_POLL_INTERVAL, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerKind,
    SchedulerState, SessionResult, plan_cycle,
};
pub use security::SecurityPolicy;
pub use select::select_candidate;
pub use session::{CheckOutcome, CheckRequest, CheckSession, Collaborators};
/// Version ordering used to decide whether a release is newer.
pub use version::{Segment, Segments, compare_versions, is_newer_version, segments};
