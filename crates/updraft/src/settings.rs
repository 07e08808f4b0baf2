use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use updraft_backend::{SettingsError, SettingsStore};
use updraft_core::{CheckInterval, SchedulerConfig, SecurityPolicy};
use updraft_http::{DEFAULT_LEGACY_SERVER_VERSION, DEFAULT_VERSION_KEY, HttpConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub appcast_url: Option<String>,

    #[serde(default)]
    pub http_headers: String,

    #[serde(default)]
    pub check_for_updates: bool,

    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    #[serde(default)]
    pub last_check_time: Option<i64>,

    #[serde(default)]
    pub skip_this_version: Option<String>,

    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    #[serde(default)]
    pub server_host: Option<String>,

    #[serde(default = "default_version_key")]
    pub server_version_key: String,

    #[serde(default = "default_legacy_server_version")]
    pub legacy_server_version: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub http_proxy: Option<String>,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_check_interval() -> u64 {
    CheckInterval::DEFAULT.as_secs()
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["https".to_string()]
}

fn default_version_key() -> String {
    DEFAULT_VERSION_KEY.to_string()
}

fn default_legacy_server_version() -> String {
    DEFAULT_LEGACY_SERVER_VERSION.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            appcast_url: None,
            http_headers: String::new(),
            check_for_updates: false,
            check_interval_secs: default_check_interval(),
            last_check_time: None,
            skip_this_version: None,
            allowed_schemes: default_allowed_schemes(),
            server_host: None,
            server_version_key: default_version_key(),
            legacy_server_version: default_legacy_server_version(),
            http_timeout_secs: default_http_timeout(),
            http_proxy: None,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl AppSettings {
    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        Self::read(path).unwrap_or_default()
    }

    /// `None` when the file is missing, unreadable or corrupt.
    fn read(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .inspect_err(|error| {
                    log::warn!(
                        "Ignoring corrupt settings file {}: {error}",
                        path.display()
                    );
                })
                .ok(),
            Err(error) => {
                log::warn!("Failed to read settings file {}: {error}", path.display());
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: CheckInterval::from_secs(self.check_interval_secs),
            ..SchedulerConfig::default()
        }
    }

    pub fn security_policy(&self) -> SecurityPolicy {
        SecurityPolicy::new(&self.allowed_schemes)
    }

    pub fn http_config(&self) -> HttpConfig {
        let config =
            HttpConfig::default().with_timeout(Duration::from_secs(self.http_timeout_secs));
        match &self.http_proxy {
            Some(proxy) if !proxy.trim().is_empty() => config.with_proxy(proxy.trim()),
            _ => config,
        }
    }
}

/// [`SettingsStore`] backed by a pretty-printed JSON file.
///
/// Reads and writes go through the file, so several stores (or processes)
/// sharing one path see each other's changes. The in-memory copy is used only
/// while the file is missing or unreadable, and keeps the last value written
/// even when persisting fails.
pub struct JsonSettingsStore {
    path: PathBuf,
    build_version: String,
    settings: Mutex<AppSettings>,
}

impl JsonSettingsStore {
    pub fn open(path: PathBuf, build_version: impl Into<String>) -> Self {
        let settings = AppSettings::load(&path);
        Self {
            path,
            build_version: build_version.into(),
            settings: Mutex::new(settings),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the in-memory copy after refreshing it from disk.
    fn current(&self) -> MutexGuard<'_, AppSettings> {
        let mut settings = self.lock();
        if let Some(on_disk) = AppSettings::read(&self.path) {
            *settings = on_disk;
        }
        settings
    }

    pub fn snapshot(&self) -> AppSettings {
        self.current().clone()
    }

    /// Apply `change` to the settings currently on disk and persist the
    /// result, leaving fields written by other stores untouched.
    pub fn update(
        &self,
        key: &'static str,
        change: impl FnOnce(&mut AppSettings),
    ) -> Result<(), SettingsError> {
        let mut settings = self.current();
        change(&mut settings);
        settings
            .save(&self.path)
            .map_err(|error| SettingsError::write(key, error.to_string()))
    }

    pub fn set_check_for_updates(&self, enabled: bool) -> Result<(), SettingsError> {
        self.update("check_for_updates", |settings| {
            settings.check_for_updates = enabled;
        })
    }
}

impl SettingsStore for JsonSettingsStore {
    fn appcast_url(&self) -> Option<String> {
        self.current().appcast_url.clone()
    }

    fn http_headers(&self) -> String {
        self.current().http_headers.clone()
    }

    fn app_build_version(&self) -> String {
        self.build_version.clone()
    }

    fn check_for_updates(&self) -> bool {
        self.current().check_for_updates
    }

    fn last_check_time(&self) -> Option<i64> {
        self.current().last_check_time
    }

    fn set_last_check_time(&self, timestamp: i64) -> Result<(), SettingsError> {
        self.update("last_check_time", |settings| {
            settings.last_check_time = Some(timestamp);
        })
    }

    fn skip_this_version(&self) -> Option<String> {
        self.current().skip_this_version.clone()
    }

    fn set_skip_this_version(&self, version: Option<&str>) -> Result<(), SettingsError> {
        self.update("skip_this_version", |settings| {
            settings.skip_this_version = version.map(str::to_string);
        })
    }
}
