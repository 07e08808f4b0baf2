//! Host-facing event handlers.
//!
//! The registry is an owned object shared through `Arc` between the host and
//! the scheduler. Every accessor holds the lock only long enough to clone the
//! handler; the handler body always runs unlocked, so handlers may register
//! or clear handlers themselves. Handlers are invoked on the scheduler's
//! background task, never on the host's own thread.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use updraft_backend::ReleaseCandidate;

use crate::error::ErrorCode;

pub type ErrorHandler = Arc<dyn Fn(ErrorCode, &str) + Send + Sync>;
pub type UpdateFoundHandler = Arc<dyn Fn(&ReleaseCandidate) + Send + Sync>;
pub type DownloadProgressHandler = Arc<dyn Fn(u64, u64) + Send + Sync>;
pub type RunInstallerHandler = Arc<dyn Fn(&Path, &str) -> bool + Send + Sync>;
pub type ShutdownQueryHandler = Arc<dyn Fn() -> bool + Send + Sync>;
pub type HostQueryHandler = Arc<dyn Fn() -> Option<String> + Send + Sync>;
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    UpdateFound,
    FeedUnavailable,
    DownloadProgress,
    DownloadComplete,
    DownloadFailed,
    UpdateNotFound,
    UpdateCancelled,
    UpdateSkipped,
    UpdatePostponed,
    UpdateDismissed,
    RunInstaller,
    CanShutdown,
    ShutdownRequest,
    AvailableHost,
}

impl EventKind {
    pub const ALL: [Self; 15] = [
        Self::Error,
        Self::UpdateFound,
        Self::FeedUnavailable,
        Self::DownloadProgress,
        Self::DownloadComplete,
        Self::DownloadFailed,
        Self::UpdateNotFound,
        Self::UpdateCancelled,
        Self::UpdateSkipped,
        Self::UpdatePostponed,
        Self::UpdateDismissed,
        Self::RunInstaller,
        Self::CanShutdown,
        Self::ShutdownRequest,
        Self::AvailableHost,
    ];
}

#[derive(Default, Clone)]
struct Handlers {
    error: Option<ErrorHandler>,
    update_found: Option<UpdateFoundHandler>,
    feed_unavailable: Option<EventHandler>,
    download_progress: Option<DownloadProgressHandler>,
    download_complete: Option<EventHandler>,
    download_failed: Option<EventHandler>,
    update_not_found: Option<EventHandler>,
    update_cancelled: Option<EventHandler>,
    update_skipped: Option<EventHandler>,
    update_postponed: Option<EventHandler>,
    update_dismissed: Option<EventHandler>,
    run_installer: Option<RunInstallerHandler>,
    can_shutdown: Option<ShutdownQueryHandler>,
    shutdown_request: Option<EventHandler>,
    available_host: Option<HostQueryHandler>,
}

impl Handlers {
    fn is_set(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Error => self.error.is_some(),
            EventKind::UpdateFound => self.update_found.is_some(),
            EventKind::FeedUnavailable => self.feed_unavailable.is_some(),
            EventKind::DownloadProgress => self.download_progress.is_some(),
            EventKind::DownloadComplete => self.download_complete.is_some(),
            EventKind::DownloadFailed => self.download_failed.is_some(),
            EventKind::UpdateNotFound => self.update_not_found.is_some(),
            EventKind::UpdateCancelled => self.update_cancelled.is_some(),
            EventKind::UpdateSkipped => self.update_skipped.is_some(),
            EventKind::UpdatePostponed => self.update_postponed.is_some(),
            EventKind::UpdateDismissed => self.update_dismissed.is_some(),
            EventKind::RunInstaller => self.run_installer.is_some(),
            EventKind::CanShutdown => self.can_shutdown.is_some(),
            EventKind::ShutdownRequest => self.shutdown_request.is_some(),
            EventKind::AvailableHost => self.available_host.is_some(),
        }
    }

    fn clear(&mut self, kind: EventKind) {
        match kind {
            EventKind::Error => self.error = None,
            EventKind::UpdateFound => self.update_found = None,
            EventKind::FeedUnavailable => self.feed_unavailable = None,
            EventKind::DownloadProgress => self.download_progress = None,
            EventKind::DownloadComplete => self.download_complete = None,
            EventKind::DownloadFailed => self.download_failed = None,
            EventKind::UpdateNotFound => self.update_not_found = None,
            EventKind::UpdateCancelled => self.update_cancelled = None,
            EventKind::UpdateSkipped => self.update_skipped = None,
            EventKind::UpdatePostponed => self.update_postponed = None,
            EventKind::UpdateDismissed => self.update_dismissed = None,
            EventKind::RunInstaller => self.run_installer = None,
            EventKind::CanShutdown => self.can_shutdown = None,
            EventKind::ShutdownRequest => self.shutdown_request = None,
            EventKind::AvailableHost => self.available_host = None,
        }
    }
}

#[derive(Default)]
pub struct CallbackRegistry {
    handlers: RwLock<Handlers>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|kind| self.is_registered(*kind))
            .collect();
        f.debug_struct("CallbackRegistry")
            .field("registered", &registered)
            .finish()
    }
}

impl CallbackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get<T>(&self, pick: impl FnOnce(&Handlers) -> Option<T>) -> Option<T> {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        pick(&handlers)
    }

    fn update(&self, apply: impl FnOnce(&mut Handlers)) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        apply(&mut handlers);
    }

    fn fire(&self, pick: impl FnOnce(&Handlers) -> Option<EventHandler>) {
        if let Some(handler) = self.get(pick) {
            handler();
        }
    }

    #[must_use]
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.get(|h| Some(h.is_set(kind))).unwrap_or(false)
    }

    pub fn clear(&self, kind: EventKind) {
        self.update(|h| h.clear(kind));
    }

    pub fn clear_all(&self) {
        self.update(|h| *h = Handlers::default());
    }

    pub fn set_error_handler(&self, handler: impl Fn(ErrorCode, &str) + Send + Sync + 'static) {
        self.update(|h| h.error = Some(Arc::new(handler)));
    }

    pub fn set_update_found_handler(
        &self,
        handler: impl Fn(&ReleaseCandidate) + Send + Sync + 'static,
    ) {
        self.update(|h| h.update_found = Some(Arc::new(handler)));
    }

    pub fn set_feed_unavailable_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.feed_unavailable = Some(Arc::new(handler)));
    }

    pub fn set_download_progress_handler(
        &self,
        handler: impl Fn(u64, u64) + Send + Sync + 'static,
    ) {
        self.update(|h| h.download_progress = Some(Arc::new(handler)));
    }

    pub fn set_download_complete_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.download_complete = Some(Arc::new(handler)));
    }

    pub fn set_download_failed_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.download_failed = Some(Arc::new(handler)));
    }

    pub fn set_update_not_found_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.update_not_found = Some(Arc::new(handler)));
    }

    pub fn set_update_cancelled_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.update_cancelled = Some(Arc::new(handler)));
    }

    pub fn set_update_skipped_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.update_skipped = Some(Arc::new(handler)));
    }

    pub fn set_update_postponed_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.update_postponed = Some(Arc::new(handler)));
    }

    pub fn set_update_dismissed_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.update_dismissed = Some(Arc::new(handler)));
    }

    pub fn set_run_installer_handler(
        &self,
        handler: impl Fn(&Path, &str) -> bool + Send + Sync + 'static,
    ) {
        self.update(|h| h.run_installer = Some(Arc::new(handler)));
    }

    pub fn set_can_shutdown_handler(&self, handler: impl Fn() -> bool + Send + Sync + 'static) {
        self.update(|h| h.can_shutdown = Some(Arc::new(handler)));
    }

    pub fn set_shutdown_request_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.update(|h| h.shutdown_request = Some(Arc::new(handler)));
    }

    pub fn set_available_host_handler(
        &self,
        handler: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) {
        self.update(|h| h.available_host = Some(Arc::new(handler)));
    }

    pub fn notify_error(&self, code: ErrorCode, message: &str) {
        if let Some(handler) = self.get(|h| h.error.clone()) {
            handler(code, message);
        }
    }

    pub fn notify_update_found(&self, candidate: &ReleaseCandidate) {
        if let Some(handler) = self.get(|h| h.update_found.clone()) {
            handler(candidate);
        }
    }

    pub fn notify_feed_unavailable(&self) {
        self.fire(|h| h.feed_unavailable.clone());
    }

    pub fn notify_download_progress(&self, downloaded: u64, total: u64) {
        if let Some(handler) = self.get(|h| h.download_progress.clone()) {
            handler(downloaded, total);
        }
    }

    pub fn notify_download_complete(&self) {
        self.fire(|h| h.download_complete.clone());
    }

    pub fn notify_download_failed(&self) {
        self.fire(|h| h.download_failed.clone());
    }

    pub fn notify_update_not_found(&self) {
        self.fire(|h| h.update_not_found.clone());
    }

    pub fn notify_update_cancelled(&self) {
        self.fire(|h| h.update_cancelled.clone());
    }

    pub fn notify_update_skipped(&self) {
        self.fire(|h| h.update_skipped.clone());
    }

    pub fn notify_update_postponed(&self) {
        self.fire(|h| h.update_postponed.clone());
    }

    pub fn notify_update_dismissed(&self) {
        self.fire(|h| h.update_dismissed.clone());
    }

    /// Ask the host to run a downloaded installer. Not permitted by default.
    #[must_use]
    pub fn run_installer(&self, installer: &Path, arguments: &str) -> bool {
        self.get(|h| h.run_installer.clone())
            .is_some_and(|handler| handler(installer, arguments))
    }

    /// Ready by default.
    #[must_use]
    pub fn is_ready_to_shutdown(&self) -> bool {
        self.get(|h| h.can_shutdown.clone())
            .is_none_or(|handler| handler())
    }

    pub fn request_shutdown(&self) {
        self.fire(|h| h.shutdown_request.clone());
    }

    #[must_use]
    pub fn available_host(&self) -> Option<String> {
        self.get(|h| h.available_host.clone())
            .and_then(|handler| handler())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use updraft_backend::ReleaseCandidate;

    use super::{CallbackRegistry, EventKind};
    use crate::error::ErrorCode;

    #[test]
    fn unset_handlers_apply_defaults() {
        let registry = CallbackRegistry::new();

        registry.notify_error(ErrorCode::Generic, "ignored");
        registry.notify_update_not_found();
        registry.request_shutdown();

        assert!(registry.is_ready_to_shutdown());
        assert!(!registry.run_installer(Path::new("/tmp/setup.exe"), "/quiet"));
        assert_eq!(registry.available_host(), None);
        for kind in EventKind::ALL {
            assert!(!registry.is_registered(kind), "{kind:?} should start unset");
        }
    }

    #[test]
    fn registered_handlers_receive_arguments() {
        let registry = CallbackRegistry::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let found = Arc::new(Mutex::new(Vec::new()));
        let progress = Arc::new(Mutex::new(Vec::new()));

        let errors_for_handler = Arc::clone(&errors);
        registry.set_error_handler(move |code, message| {
            errors_for_handler
                .lock()
                .expect("errors lock")
                .push((code, message.to_string()));
        });
        let found_for_handler = Arc::clone(&found);
        registry.set_update_found_handler(move |candidate| {
            found_for_handler
                .lock()
                .expect("found lock")
                .push(candidate.version.clone());
        });
        let progress_for_handler = Arc::clone(&progress);
        registry.set_download_progress_handler(move |downloaded, total| {
            progress_for_handler
                .lock()
                .expect("progress lock")
                .push((downloaded, total));
        });

        registry.notify_error(ErrorCode::FeedUnavailable, "offline");
        registry.notify_update_found(&ReleaseCandidate::new("2.0"));
        registry.notify_download_progress(10, 100);

        assert_eq!(
            *errors.lock().expect("errors lock"),
            vec![(ErrorCode::FeedUnavailable, "offline".to_string())]
        );
        assert_eq!(*found.lock().expect("found lock"), vec!["2.0".to_string()]);
        assert_eq!(*progress.lock().expect("progress lock"), vec![(10, 100)]);
    }

    #[test]
    fn query_handlers_override_defaults() {
        let registry = CallbackRegistry::new();
        registry.set_can_shutdown_handler(|| false);
        registry.set_run_installer_handler(|path, args| {
            path == Path::new("/tmp/setup.exe") && args == "/quiet"
        });
        registry.set_available_host_handler(|| Some("https://api.example.com".to_string()));

        assert!(!registry.is_ready_to_shutdown());
        assert!(registry.run_installer(Path::new("/tmp/setup.exe"), "/quiet"));
        assert!(!registry.run_installer(Path::new("/tmp/other.exe"), ""));
        assert_eq!(
            registry.available_host().as_deref(),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn simple_events_fire_their_own_handler() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let setters: [fn(&CallbackRegistry, Arc<AtomicUsize>); 10] = [
            |r, c| r.set_feed_unavailable_handler(move || bump(&c)),
            |r, c| r.set_download_complete_handler(move || bump(&c)),
            |r, c| r.set_download_failed_handler(move || bump(&c)),
            |r, c| r.set_update_not_found_handler(move || bump(&c)),
            |r, c| r.set_update_cancelled_handler(move || bump(&c)),
            |r, c| r.set_update_skipped_handler(move || bump(&c)),
            |r, c| r.set_update_postponed_handler(move || bump(&c)),
            |r, c| r.set_update_dismissed_handler(move || bump(&c)),
            |r, c| r.set_shutdown_request_handler(move || bump(&c)),
            |r, c| r.set_can_shutdown_handler(move || {
                bump(&c);
                true
            }),
        ];
        for setter in setters {
            setter(&registry, Arc::clone(&counter));
        }

        registry.notify_feed_unavailable();
        registry.notify_download_complete();
        registry.notify_download_failed();
        registry.notify_update_not_found();
        registry.notify_update_cancelled();
        registry.notify_update_skipped();
        registry.notify_update_postponed();
        registry.notify_update_dismissed();
        registry.request_shutdown();
        assert!(registry.is_ready_to_shutdown());

        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn clear_removes_single_handler() {
        let registry = CallbackRegistry::new();
        registry.set_update_not_found_handler(|| {});
        registry.set_update_skipped_handler(|| {});

        registry.clear(EventKind::UpdateNotFound);

        assert!(!registry.is_registered(EventKind::UpdateNotFound));
        assert!(registry.is_registered(EventKind::UpdateSkipped));

        registry.clear_all();
        assert!(!registry.is_registered(EventKind::UpdateSkipped));
    }

    #[test]
    fn handler_can_reregister_without_deadlock() {
        let registry = Arc::new(CallbackRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let registry_for_handler = Arc::clone(&registry);
        let calls_for_handler = Arc::clone(&calls);
        registry.set_update_not_found_handler(move || {
            calls_for_handler.fetch_add(1, Ordering::SeqCst);
            let calls_again = Arc::clone(&calls_for_handler);
            registry_for_handler.set_update_not_found_handler(move || {
                calls_again.fetch_add(10, Ordering::SeqCst);
            });
        });

        registry.notify_update_not_found();
        registry.notify_update_not_found();

        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn concurrent_registration_and_notification() {
        let registry = Arc::new(CallbackRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            let calls = Arc::clone(&calls);
                            registry.set_update_dismissed_handler(move || {
                                calls.fetch_add(1, Ordering::SeqCst);
                            });
                        } else {
                            registry.notify_update_dismissed();
                        }
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("worker thread should not panic");
        }

        assert!(registry.is_registered(EventKind::UpdateDismissed));
        assert!(calls.load(Ordering::SeqCst) <= 400);
    }

    #[test]
    fn debug_lists_registered_events() {
        let registry = CallbackRegistry::new();
        registry.set_update_found_handler(|_| {});

        assert_eq!(
            format!("{registry:?}"),
            "CallbackRegistry { registered: [UpdateFound] }"
        );
    }
}
