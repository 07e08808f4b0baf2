use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use updraft_backend::{
    CompatibilitySource, DownloadError, DownloadOptions, FeedParseError, FeedParser, FeedSource,
    HttpHeaders, ReleaseCandidate, SettingsError, SettingsStore,
};

use crate::callbacks::CallbackRegistry;
use crate::session::Collaborators;

pub(crate) struct MockFeed {
    result: Mutex<Result<Vec<u8>, DownloadError>>,
    fetches: AtomicUsize,
    last_request: Mutex<Option<(HttpHeaders, DownloadOptions)>>,
}

impl MockFeed {
    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn last_options(&self) -> Option<DownloadOptions> {
        self.last_request
            .lock()
            .expect("request lock")
            .as_ref()
            .map(|(_, options)| *options)
    }

    pub(crate) fn last_headers(&self) -> Option<HttpHeaders> {
        self.last_request
            .lock()
            .expect("request lock")
            .as_ref()
            .map(|(headers, _)| headers.clone())
    }
}

#[async_trait]
impl FeedSource for MockFeed {
    async fn fetch(
        &self,
        _url: &str,
        headers: &HttpHeaders,
        options: DownloadOptions,
    ) -> Result<Vec<u8>, DownloadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("request lock") = Some((headers.clone(), options));
        self.result.lock().expect("result lock").clone()
    }
}

pub(crate) struct MockParser {
    result: Mutex<Result<Vec<ReleaseCandidate>, FeedParseError>>,
}

impl FeedParser for MockParser {
    fn parse(&self, _bytes: &[u8]) -> Result<Vec<ReleaseCandidate>, FeedParseError> {
        self.result.lock().expect("result lock").clone()
    }
}

pub(crate) struct StaticCompatibility(Mutex<String>);

#[async_trait]
impl CompatibilitySource for StaticCompatibility {
    async fn server_version(&self) -> String {
        self.0.lock().expect("version lock").clone()
    }
}

pub(crate) struct MemorySettings {
    appcast_url: Mutex<Option<String>>,
    http_headers: Mutex<String>,
    build_version: String,
    enabled: Mutex<bool>,
    last_check: Mutex<Option<i64>>,
    skip: Mutex<Option<String>>,
}

impl MemorySettings {
    pub(crate) fn last_check(&self) -> Option<i64> {
        *self.last_check.lock().expect("last check lock")
    }
}

impl SettingsStore for MemorySettings {
    fn appcast_url(&self) -> Option<String> {
        self.appcast_url.lock().expect("url lock").clone()
    }

    fn http_headers(&self) -> String {
        self.http_headers.lock().expect("headers lock").clone()
    }

    fn app_build_version(&self) -> String {
        self.build_version.clone()
    }

    fn check_for_updates(&self) -> bool {
        *self.enabled.lock().expect("enabled lock")
    }

    fn last_check_time(&self) -> Option<i64> {
        self.last_check()
    }

    fn set_last_check_time(&self, timestamp: i64) -> Result<(), SettingsError> {
        *self.last_check.lock().expect("last check lock") = Some(timestamp);
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

pub(crate) struct Fixture {
    pub(crate) callbacks: Arc<CallbackRegistry>,
    pub(crate) feed: Arc<MockFeed>,
    pub(crate) parser: Arc<MockParser>,
    pub(crate) compatibility: Arc<StaticCompatibility>,
    pub(crate) settings: Arc<MemorySettings>,
}

impl Fixture {
    pub(crate) fn new(build_version: &str) -> Self {
        Self {
            callbacks: Arc::new(CallbackRegistry::new()),
            feed: Arc::new(MockFeed {
                result: Mutex::new(Ok(b"feed".to_vec())),
                fetches: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }),
            parser: Arc::new(MockParser {
                result: Mutex::new(Ok(Vec::new())),
            }),
            compatibility: Arc::new(StaticCompatibility(Mutex::new(String::new()))),
            settings: Arc::new(MemorySettings {
                appcast_url: Mutex::new(Some("https://example.com/feed.json".to_string())),
                http_headers: Mutex::new(String::new()),
                build_version: build_version.to_string(),
                enabled: Mutex::new(true),
                last_check: Mutex::new(None),
                skip: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn with_feed(self, candidates: Vec<ReleaseCandidate>) -> Self {
        *self.parser.result.lock().expect("result lock") = Ok(candidates);
        self
    }

    pub(crate) fn with_parse_error(self, error: FeedParseError) -> Self {
        *self.parser.result.lock().expect("result lock") = Err(error);
        self
    }

    pub(crate) fn with_fetch_error(self, error: DownloadError) -> Self {
        *self.feed.result.lock().expect("result lock") = Err(error);
        self
    }

    pub(crate) fn with_server_version(self, version: &str) -> Self {
        *self.compatibility.0.lock().expect("version lock") = version.to_string();
        self
    }

    pub(crate) fn with_appcast_url(self, url: &str) -> Self {
        *self.settings.appcast_url.lock().expect("url lock") = Some(url.to_string());
        self
    }

    pub(crate) fn without_appcast_url(self) -> Self {
        *self.settings.appcast_url.lock().expect("url lock") = None;
        self
    }

    pub(crate) fn with_http_headers(self, headers: &str) -> Self {
        *self.settings.http_headers.lock().expect("headers lock") = headers.to_string();
        self
    }

    pub(crate) fn with_skipped(self, version: &str) -> Self {
        *self.settings.skip.lock().expect("skip lock") = Some(version.to_string());
        self
    }

    pub(crate) fn with_checks_enabled(self, enabled: bool) -> Self {
        *self.settings.enabled.lock().expect("enabled lock") = enabled;
        self
    }

    pub(crate) fn with_last_check(self, timestamp: i64) -> Self {
        *self.settings.last_check.lock().expect("last check lock") = Some(timestamp);
        self
    }

    pub(crate) fn collaborators(&self) -> Collaborators {
        Collaborators {
            feed_source: Arc::clone(&self.feed) as Arc<dyn FeedSource>,
            feed_parser: Arc::clone(&self.parser) as Arc<dyn FeedParser>,
            compatibility: Arc::clone(&self.compatibility) as Arc<dyn CompatibilitySource>,
            settings: Arc::clone(&self.settings) as Arc<dyn SettingsStore>,
        }
    }
}

/// Records the callbacks a check fires, in order.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub(crate) fn attach(callbacks: &CallbackRegistry) -> Self {
        let log = Self::default();

        let sink = log.clone();
        callbacks.set_error_handler(move |code, message| {
            sink.push(format!("error {code:?} {message}"));
        });
        let sink = log.clone();
        callbacks.set_update_found_handler(move |candidate| {
            sink.push(format!("found {}", candidate.version));
        });
        let sink = log.clone();
        callbacks.set_update_not_found_handler(move || sink.push("not-found".to_string()));
        let sink = log.clone();
        callbacks.set_feed_unavailable_handler(move || sink.push("feed-unavailable".to_string()));

        log
    }

    fn push(&self, entry: String) {
        self.0.lock().expect("event log lock").push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().expect("event log lock").clone()
    }
}
