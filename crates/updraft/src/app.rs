use std::sync::Arc;

use log::{debug, info, warn};
use updraft_backend::SettingsStore;
use updraft_core::{
    CallbackRegistry, CheckOutcome, CheckSession, Collaborators, Scheduler, SchedulerKind,
    SessionResult,
};
use updraft_http::{HttpCompatibilitySource, HttpFeedSource, JsonFeedParser};
use updraft_platform::AppPaths;

use crate::console;
use crate::error::AppError;
use crate::settings::JsonSettingsStore;
use crate::single_instance::{AcquireError, SingleInstance};

pub struct App {
    paths: AppPaths,
    store: Arc<JsonSettingsStore>,
    callbacks: Arc<CallbackRegistry>,
}

impl App {
    pub fn new(paths: AppPaths, build_version: &str) -> Self {
        let store = Arc::new(JsonSettingsStore::open(
            paths.settings_file(),
            build_version,
        ));
        let callbacks = Arc::new(CallbackRegistry::new());
        console::register(&callbacks, &store);

        Self {
            paths,
            store,
            callbacks,
        }
    }

    pub fn store(&self) -> &Arc<JsonSettingsStore> {
        &self.store
    }

    fn session(&self) -> Result<CheckSession, AppError> {
        let settings = self.store.snapshot();
        let http = settings.http_config();

        let feed_source = HttpFeedSource::new(&http)
            .map_err(|error| AppError::startup_failed("build feed client", error))?;
        let compatibility = HttpCompatibilitySource::new(&http, Arc::clone(&self.callbacks))
            .map_err(|error| AppError::startup_failed("build server client", error))?
            .with_version_key(settings.server_version_key.clone())
            .with_legacy_version(settings.legacy_server_version.clone());

        let collaborators = Collaborators {
            feed_source: Arc::new(feed_source),
            feed_parser: Arc::new(JsonFeedParser),
            compatibility: Arc::new(compatibility),
            settings: Arc::clone(&self.store) as Arc<dyn SettingsStore>,
        };

        Ok(CheckSession::new(
            collaborators,
            Arc::clone(&self.callbacks),
            settings.security_policy(),
        ))
    }

    fn acquire_instance(&self) -> Result<SingleInstance, AppError> {
        SingleInstance::acquire(&self.paths.lock_file()).map_err(|error| match error {
            AcquireError::AlreadyRunning => AppError::AlreadyRunning,
            other => AppError::startup_failed("acquire instance lock", other),
        })
    }

    /// Run one check and wait for its result.
    pub async fn check_once(&self, kind: SchedulerKind) -> Result<CheckOutcome, AppError> {
        let _instance = self.acquire_instance()?;
        let session = self.session()?;
        let config = self.store.snapshot().scheduler_config();

        let handle = Scheduler::start(kind, session, config).await;
        debug!("Waiting for {kind:?} check");
        finish(handle.join().await)
    }

    /// Check periodically until Ctrl-C.
    pub async fn watch(&self) -> Result<(), AppError> {
        let _instance = self.acquire_instance()?;
        let session = self.session()?;
        let config = self.store.snapshot().scheduler_config();
        info!(
            "Watching for updates every {}s",
            config.interval.as_secs()
        );

        let handle = Scheduler::start(SchedulerKind::Periodic, session, config).await;
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {error}");
        }
        info!("Stopping update scheduler");
        handle.cancel();
        handle.join().await;
        Ok(())
    }

    pub fn skip(&self, version: &str) -> Result<(), AppError> {
        self.store
            .set_skip_this_version(Some(version))
            .map_err(|error| AppError::settings_update_failed("skip_this_version", error))?;
        info!("Version {version} will not be offered by background checks");
        Ok(())
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), AppError> {
        self.store
            .set_check_for_updates(enabled)
            .map_err(|error| AppError::settings_update_failed("check_for_updates", error))?;
        info!(
            "Automatic update checks {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }
}

fn finish(result: Option<SessionResult>) -> Result<CheckOutcome, AppError> {
    match result {
        Some(Ok(outcome)) => Ok(outcome),
        Some(Err(error)) => Err(AppError::update_check_failed(error)),
        None => Err(AppError::SchedulerCancelled),
    }
}
