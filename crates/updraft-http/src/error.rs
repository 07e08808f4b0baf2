use thiserror::Error;

/// Why the server version could not be determined.
///
/// [`crate::HttpCompatibilitySource`] collapses all of these to an empty
/// version; the detail only reaches the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityError {
    #[error("No server host is available")]
    NoHost,

    #[error("Version request to {url} failed: {details}")]
    Request { url: String, details: String },

    #[error("Version response from {url} is not JSON: {details}")]
    Parse { url: String, details: String },

    #[error("Version response from {url} has no usable version")]
    MissingVersion { url: String },
}

impl CompatibilityError {
    pub(crate) fn request_from<E>(url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Request {
            url: url.to_string(),
            details: error.to_string(),
        }
    }

    pub(crate) fn parse_from<E>(url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Parse {
            url: url.to_string(),
            details: error.to_string(),
        }
    }
}
