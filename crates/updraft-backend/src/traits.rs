use async_trait::async_trait;

use crate::error::{DownloadError, FeedParseError, SettingsError};
use crate::types::{DownloadOptions, HttpHeaders, ReleaseCandidate};

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &HttpHeaders,
        options: DownloadOptions,
    ) -> Result<Vec<u8>, DownloadError>;
}

pub trait FeedParser: Send + Sync {
    /// Parse raw feed bytes into release candidates, in feed order.
    ///
    /// # Errors
    /// Returns an error when the feed is empty or cannot be understood.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<ReleaseCandidate>, FeedParseError>;
}

#[async_trait]
pub trait CompatibilitySource: Send + Sync {
    /// Resolve the version of the server this deployment talks to.
    ///
    /// Best effort: any failure yields an empty string.
    async fn server_version(&self) -> String;
}

/// Persisted checker settings.
///
/// Implementations are responsible for their own synchronisation; the checker
/// only ever touches them sequentially from one session.
pub trait SettingsStore: Send + Sync {
    fn appcast_url(&self) -> Option<String>;

    /// Raw `Name: value` header block sent with the feed request.
    fn http_headers(&self) -> String {
        String::new()
    }

    fn app_build_version(&self) -> String;

    fn check_for_updates(&self) -> bool;

    /// Unix timestamp (seconds) of the last completed check.
    fn last_check_time(&self) -> Option<i64>;

    /// # Errors
    /// Returns an error when the value cannot be persisted.
    fn set_last_check_time(&self, timestamp: i64) -> Result<(), SettingsError>;

    fn skip_this_version(&self) -> Option<String>;

    /// # Errors
    /// Returns an error when the value cannot be persisted.
    fn set_skip_this_version(&self, version: Option<&str>) -> Result<(), SettingsError>;

    /// # Errors
    /// Returns an error when the value cannot be persisted.
    fn clear_skip_this_version(&self) -> Result<(), SettingsError> {
        self.set_skip_this_version(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemorySettings {
        skip: Mutex<Option<String>>,
    }

    impl SettingsStore for MemorySettings {
        fn appcast_url(&self) -> Option<String> {
            None
        }

        fn app_build_version(&self) -> String {
            "1.0".to_string()
        }

        fn check_for_updates(&self) -> bool {
            true
        }

        fn last_check_time(&self) -> Option<i64> {
            None
        }

        fn set_last_check_time(&self, _timestamp: i64) -> Result<(), SettingsError> {
            Ok(())
        }

        fn skip_this_version(&self) -> Option<String> {
            self.skip.lock().expect("skip lock").clone()
        }

        fn set_skip_this_version(&self, version: Option<&str>) -> Result<(), SettingsError> {
            *self.skip.lock().expect("skip lock") = version.map(str::to_string);
            Ok(())
        }
    }

    struct StaticFeed(&'static [u8]);

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn fetch(
            &self,
            _url: &str,
            _headers: &HttpHeaders,
            _options: DownloadOptions,
        ) -> Result<Vec<u8>, DownloadError> {
            Ok(self.0.to_vec())
        }
    }

    #[test]
    fn default_http_headers_are_empty() {
        assert!(MemorySettings::default().http_headers().is_empty());
    }

    #[test]
    fn clear_skip_this_version_resets_value() {
        let settings = MemorySettings::default();
        settings
            .set_skip_this_version(Some("2.0"))
            .expect("skip should be stored");
        assert_eq!(settings.skip_this_version().as_deref(), Some("2.0"));

        settings
            .clear_skip_this_version()
            .expect("skip should be cleared");

        assert_eq!(settings.skip_this_version(), None);
    }

    #[tokio::test]
    async fn feed_source_is_object_safe() {
        let source: Box<dyn FeedSource> = Box::new(StaticFeed(b"[]"));

        let bytes = source
            .fetch(
                "https://example.com/feed.json",
                &HttpHeaders::default(),
                DownloadOptions::bypass_proxies(),
            )
            .await
            .expect("static feed should succeed");

        assert_eq!(bytes, b"[]");
    }
}
