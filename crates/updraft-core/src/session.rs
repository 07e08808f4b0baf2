use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use log::{debug, error, info, warn};
use updraft_backend::{
    CompatibilitySource, DownloadOptions, FeedParser, FeedSource, HttpHeaders, ReleaseCandidate,
    SettingsStore,
};

use crate::callbacks::CallbackRegistry;
use crate::error::{CheckError, ErrorCode};
use crate::security::SecurityPolicy;
use crate::select::select_candidate;
use crate::version::is_newer_version;

/// The external services one check talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub feed_source: Arc<dyn FeedSource>,
    pub feed_parser: Arc<dyn FeedParser>,
    pub compatibility: Arc<dyn CompatibilitySource>,
    pub settings: Arc<dyn SettingsStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRequest {
    /// The user is waiting on this check: failures and "no update" are
    /// reported through callbacks and a skipped version is shown anyway.
    pub show_dialog: bool,
    /// Respect the version the user chose to skip.
    pub honor_skip: bool,
}

impl CheckRequest {
    #[must_use]
    pub fn background() -> Self {
        Self {
            show_dialog: false,
            honor_skip: true,
        }
    }

    #[must_use]
    pub fn manual() -> Self {
        Self {
            show_dialog: true,
            honor_skip: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    NoApplicableCandidate,
    AlreadyUpToDate,
    UpdateAvailable(ReleaseCandidate),
    SkippedByUser(ReleaseCandidate),
}

impl CheckOutcome {
    #[must_use]
    pub fn update(&self) -> Option<&ReleaseCandidate> {
        match self {
            Self::UpdateAvailable(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// One end-to-end update check.
#[derive(Clone)]
pub struct CheckSession {
    collaborators: Collaborators,
    callbacks: Arc<CallbackRegistry>,
    security: SecurityPolicy,
}

impl CheckSession {
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        callbacks: Arc<CallbackRegistry>,
        security: SecurityPolicy,
    ) -> Self {
        Self {
            collaborators,
            callbacks,
            security,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.collaborators.settings
    }

    #[must_use]
    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    /// Run the check and notify the host of the outcome.
    ///
    /// A panic in a collaborator or a host callback is contained here and
    /// surfaces as [`CheckError::Unexpected`].
    ///
    /// # Errors
    /// Returns the failure that aborted the check. When `show_dialog` is set
    /// the error callback has already been invoked.
    pub async fn run(&self, request: CheckRequest) -> Result<CheckOutcome, CheckError> {
        let result = AssertUnwindSafe(self.perform(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CheckError::from_panic(panic.as_ref())));

        match result {
            Ok(outcome) => Ok(outcome),
            Err(check_error) => {
                if check_error.is_security_violation() {
                    error!("Update check aborted: {check_error}");
                } else {
                    warn!("Update check failed: {check_error}");
                }
                if request.show_dialog {
                    self.report_error(&check_error);
                }
                Err(check_error)
            }
        }
    }

    async fn perform(&self, request: CheckRequest) -> Result<CheckOutcome, CheckError> {
        let settings = &self.collaborators.settings;

        let url = settings
            .appcast_url()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CheckError::configuration("no appcast URL is configured"))?;
        self.security.assert_secure(&url, "appcast feed")?;

        debug!("Fetching update feed from {url}");
        let headers = HttpHeaders::parse(&settings.http_headers());
        let feed = self
            .collaborators
            .feed_source
            .fetch(&url, &headers, DownloadOptions::bypass_proxies())
            .await?;

        let candidates = self.collaborators.feed_parser.parse(&feed)?;
        debug!("Feed lists {} release(s)", candidates.len());

        let server_version = self.collaborators.compatibility.server_version().await;
        if server_version.is_empty() {
            warn!("Server version unavailable; releases with a server requirement are excluded");
        } else {
            debug!("Server version: {server_version}");
        }

        let current_version = settings.app_build_version();
        let Some(candidate) = select_candidate(candidates, &current_version, &server_version)
        else {
            self.record_check_time();
            info!("No applicable release in the update feed");
            self.callbacks.notify_update_not_found();
            return Ok(CheckOutcome::NoApplicableCandidate);
        };

        if let Some(notes_url) = candidate.release_notes_url() {
            self.security.assert_secure(notes_url, "release notes")?;
        }
        if let Some(download_url) = candidate.download_url() {
            self.security.assert_secure(download_url, "update file")?;
        }

        self.record_check_time();

        if !candidate.is_valid() || !is_newer_version(&candidate.version, &current_version) {
            info!(
                "Already up to date (installed {current_version}, feed offers {})",
                candidate.version
            );
            self.callbacks.notify_update_not_found();
            return Ok(CheckOutcome::AlreadyUpToDate);
        }

        if request.honor_skip && !request.show_dialog && self.is_skipped(&candidate) {
            info!("Update {} was skipped by the user", candidate.version);
            return Ok(CheckOutcome::SkippedByUser(candidate));
        }

        info!(
            "Update available: {current_version} -> {}{}",
            candidate.version,
            if candidate.critical_update {
                " (critical)"
            } else {
                ""
            }
        );
        self.callbacks.notify_update_found(&candidate);
        Ok(CheckOutcome::UpdateAvailable(candidate))
    }

    fn is_skipped(&self, candidate: &ReleaseCandidate) -> bool {
        if candidate.critical_update {
            return false;
        }
        self.collaborators
            .settings
            .skip_this_version()
            .is_some_and(|skipped| skipped == candidate.version)
    }

    fn record_check_time(&self) {
        let now = Utc::now().timestamp();
        if let Err(error) = self.collaborators.settings.set_last_check_time(now) {
            warn!("Failed to record last update check time: {error}");
        }
    }

    fn report_error(&self, check_error: &CheckError) {
        let code = check_error.code();
        let reported = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.callbacks.notify_error(code, &check_error.to_string());
            if code == ErrorCode::FeedUnavailable {
                self.callbacks.notify_feed_unavailable();
            }
        }));
        if reported.is_err() {
            error!("Error callback panicked while reporting: {check_error}");
        }
    }
}
