use serde::{Deserialize, Serialize};

/// One release entry from the feed.
///
/// Produced by a [`FeedParser`](crate::FeedParser) and consumed read-only by
/// candidate selection. Lives only for the duration of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub version: String,
    #[serde(default)]
    pub min_server_version: String,
    #[serde(default)]
    pub critical_update: bool,
    #[serde(default)]
    pub release_notes_url: Option<String>,
    #[serde(default)]
    pub download_url: String,
}

impl ReleaseCandidate {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            min_server_version: String::new(),
            critical_update: false,
            release_notes_url: None,
            download_url: String::new(),
        }
    }

    #[must_use]
    pub fn with_min_server_version(mut self, version: impl Into<String>) -> Self {
        self.min_server_version = version.into();
        self
    }

    #[must_use]
    pub fn critical(mut self) -> Self {
        self.critical_update = true;
        self
    }

    #[must_use]
    pub fn with_release_notes_url(mut self, url: impl Into<String>) -> Self {
        self.release_notes_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    /// A candidate without a version string cannot be offered to the user.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.version.is_empty()
    }

    /// Release notes URL, treating an empty string the same as absent.
    #[must_use]
    pub fn release_notes_url(&self) -> Option<&str> {
        self.release_notes_url.as_deref().filter(|url| !url.is_empty())
    }

    #[must_use]
    pub fn download_url(&self) -> Option<&str> {
        Some(self.download_url.as_str()).filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Connect directly, ignoring any system proxy. Only used for requests
    /// against infrastructure the host has explicitly decided to trust.
    pub bypass_proxies: bool,
}

impl DownloadOptions {
    #[must_use]
    pub fn bypass_proxies() -> Self {
        Self {
            bypass_proxies: true,
        }
    }
}

/// Extra HTTP headers supplied by the host as a raw `Name: value` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    entries: Vec<(String, String)>,
}

impl HttpHeaders {
    /// Parse a CRLF or LF separated header block.
    ///
    /// Lines without a colon or with an empty name are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .lines()
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
