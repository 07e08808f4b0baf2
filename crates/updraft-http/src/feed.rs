use async_trait::async_trait;
use log::debug;
use updraft_backend::{DownloadError, DownloadOptions, FeedSource, HttpHeaders};

use crate::client::{HttpConfig, response_snippet};

const SNIPPET_CHARS: usize = 160;

/// Downloads the appcast over HTTP(S).
///
/// Two clients are kept so that requests asking to bypass proxies do not
/// rebuild a client on every check.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    direct_client: reqwest::Client,
}

impl HttpFeedSource {
    /// Build a feed source from the given HTTP settings.
    ///
    /// # Errors
    /// Returns [`DownloadError::Client`] if reqwest cannot initialise a client,
    /// for example when no TLS backend is available.
    pub fn new(config: &HttpConfig) -> Result<Self, DownloadError> {
        let build = |bypass_proxies| {
            config
                .build_client(bypass_proxies)
                .map_err(|error| DownloadError::Client {
                    details: error.to_string(),
                })
        };

        Ok(Self {
            client: build(false)?,
            direct_client: build(true)?,
        })
    }

    fn client_for(&self, options: DownloadOptions) -> &reqwest::Client {
        if options.bypass_proxies {
            &self.direct_client
        } else {
            &self.client
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(
        &self,
        url: &str,
        headers: &HttpHeaders,
        options: DownloadOptions,
    ) -> Result<Vec<u8>, DownloadError> {
        debug!(
            "Fetching appcast from {url} (bypass_proxies={})",
            options.bypass_proxies
        );

        let mut request = self.client_for(options).get(url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|error| DownloadError::request_from(url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, SNIPPET_CHARS))
                .unwrap_or_default();
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body_snippet,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| DownloadError::body_from(url, error))?;
        debug!("Fetched {} bytes from {url}", body.len());
        Ok(body.to_vec())
    }
}
