use url::Url;

use crate::error::CheckError;

/// Transport schemes a URL must use before the checker touches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    allowed_schemes: Vec<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["https".to_string()],
        }
    }
}

impl SecurityPolicy {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_schemes: schemes
                .into_iter()
                .map(|scheme| scheme.as_ref().trim().to_ascii_lowercase())
                .filter(|scheme| !scheme.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn allowed_schemes(&self) -> &[String] {
        &self.allowed_schemes
    }

    #[must_use]
    pub fn is_secure(&self, url: &str) -> bool {
        Url::parse(url.trim()).is_ok_and(|parsed| {
            self.allowed_schemes
                .iter()
                .any(|scheme| scheme == parsed.scheme())
        })
    }

    /// Reject `url` unless it parses and uses an allowed scheme.
    ///
    /// # Errors
    /// Returns [`CheckError::InsecureSource`] naming `context` on rejection.
    pub fn assert_secure(&self, url: &str, context: &'static str) -> Result<(), CheckError> {
        if self.is_secure(url) {
            Ok(())
        } else {
            log::warn!("Rejected insecure {context} URL: {url}");
            Err(CheckError::insecure(context, url))
        }
    }
}
