use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("updraft/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every reqwest client this crate builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Explicit proxy for every scheme. `None` leaves reqwest's system proxy
    /// detection in place. Ignored by clients that bypass proxies.
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub(crate) fn build_client(
        &self,
        bypass_proxies: bool,
    ) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout);
        if bypass_proxies {
            builder = builder.no_proxy();
        } else if let Some(proxy) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }
        builder.build()
    }
}

pub(crate) fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.trim().chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
