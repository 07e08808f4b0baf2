use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Request to {url} failed: {details}")]
    Request { url: String, details: String },

    #[error("Request to {url} failed with HTTP {status}{body_snippet}")]
    HttpStatus {
        url: String,
        status: u16,
        body_snippet: String,
    },

    #[error("Failed to read response body from {url}: {details}")]
    Body { url: String, details: String },

    #[error("Failed to build HTTP client: {details}")]
    Client { details: String },
}

impl DownloadError {
    pub fn request_from<E>(url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Request {
            url: url.to_string(),
            details: error.to_string(),
        }
    }

    pub fn body_from<E>(url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Body {
            url: url.to_string(),
            details: error.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedParseError {
    #[error("Feed is empty")]
    Empty,

    #[error("Feed is malformed: {details}")]
    Malformed { details: String },
}

impl FeedParseError {
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed {
            details: details.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Failed to read setting {key}: {details}")]
    Read { key: &'static str, details: String },

    #[error("Failed to write setting {key}: {details}")]
    Write { key: &'static str, details: String },
}

impl SettingsError {
    pub fn read(key: &'static str, details: impl Into<String>) -> Self {
        Self::Read {
            key,
            details: details.into(),
        }
    }

    pub fn write(key: &'static str, details: impl Into<String>) -> Self {
        Self::Write {
            key,
            details: details.into(),
        }
    }
}
