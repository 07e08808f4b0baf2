use std::any::Any;

use thiserror::Error;
use updraft_backend::{DownloadError, FeedParseError};

/// Category reported to the host's error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Generic,
    FeedUnavailable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("The update source configuration is missing: {details}")]
    Configuration { details: String },

    #[error("Refusing to use insecure URL for {context}: {url}")]
    InsecureSource { context: &'static str, url: String },

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Update feed is unavailable: {0}")]
    FeedUnavailable(#[source] FeedParseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CheckError {
    pub fn configuration(details: impl Into<String>) -> Self {
        Self::Configuration {
            details: details.into(),
        }
    }

    pub fn insecure(context: &'static str, url: impl Into<String>) -> Self {
        Self::InsecureSource {
            context,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Download(_) | Self::FeedUnavailable(_) => ErrorCode::FeedUnavailable,
            Self::Configuration { .. } | Self::InsecureSource { .. } | Self::Unexpected(_) => {
                ErrorCode::Generic
            }
        }
    }

    /// Describe a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "check panicked".to_string());
        Self::Unexpected(message)
    }

    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::InsecureSource { .. })
    }
}

impl From<FeedParseError> for CheckError {
    fn from(error: FeedParseError) -> Self {
        Self::FeedUnavailable(error)
    }
}
