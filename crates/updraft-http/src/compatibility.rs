use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use updraft_backend::CompatibilitySource;
use updraft_core::CallbackRegistry;

use crate::client::HttpConfig;
use crate::error::CompatibilityError;

pub const DEFAULT_VERSION_KEY: &str = "serverVersion";

/// Reported for servers whose `/getVersion` endpoint answers 404.
pub const DEFAULT_LEGACY_SERVER_VERSION: &str = "2.1.2";

const VERSION_PATH: &str = "/getVersion";
const ERROR_KEY: &str = "error_msg";

/// Queries the paired server for its version.
///
/// The base URL comes from the host application through the
/// [`CallbackRegistry`] available-host query, so it can change between checks.
/// The server is reached directly, never through a proxy.
pub struct HttpCompatibilitySource {
    client: reqwest::Client,
    callbacks: Arc<CallbackRegistry>,
    version_key: String,
    legacy_version: String,
}

impl HttpCompatibilitySource {
    /// # Errors
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(
        config: &HttpConfig,
        callbacks: Arc<CallbackRegistry>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: config.build_client(true)?,
            callbacks,
            version_key: DEFAULT_VERSION_KEY.to_string(),
            legacy_version: DEFAULT_LEGACY_SERVER_VERSION.to_string(),
        })
    }

    #[must_use]
    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_key = key.into();
        self
    }

    #[must_use]
    pub fn with_legacy_version(mut self, version: impl Into<String>) -> Self {
        self.legacy_version = version.into();
        self
    }

    /// Like [`CompatibilitySource::server_version`], but keeps the reason a
    /// version could not be determined.
    ///
    /// # Errors
    /// See [`CompatibilityError`].
    pub async fn fetch_server_version(&self) -> Result<String, CompatibilityError> {
        let host = self
            .callbacks
            .available_host()
            .filter(|host| !host.trim().is_empty())
            .ok_or(CompatibilityError::NoHost)?;
        let url = format!("{}{VERSION_PATH}", host.trim().trim_end_matches('/'));

        // Error statuses still carry the JSON body that reports a missing endpoint.
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| CompatibilityError::request_from(&url, error))?;
        let body = response
            .bytes()
            .await
            .map_err(|error| CompatibilityError::request_from(&url, error))?;
        let document: Value = serde_json::from_slice(&body)
            .map_err(|error| CompatibilityError::parse_from(&url, error))?;

        self.interpret(&document)
            .ok_or(CompatibilityError::MissingVersion { url })
    }

    fn interpret(&self, document: &Value) -> Option<String> {
        let string_field = |key: &str| {
            document
                .get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        };

        if let Some(version) = string_field(&self.version_key) {
            return Some(version.to_string());
        }

        string_field(ERROR_KEY)
            .filter(|message| message.contains("404"))
            .map(|_| self.legacy_version.clone())
    }
}

#[async_trait]
impl CompatibilitySource for HttpCompatibilitySource {
    async fn server_version(&self) -> String {
        match self.fetch_server_version().await {
            Ok(version) => {
                debug!("Server reports version {version}");
                version
            }
            Err(CompatibilityError::NoHost) => {
                debug!("No server host available; server version unknown");
                String::new()
            }
            Err(error) => {
                warn!("Could not determine server version: {error}");
                String::new()
            }
        }
    }
}
