//! Background drivers for [`CheckSession`].
//!
//! A scheduler owns exactly one tokio task. The task signals readiness before
//! doing any work, publishes its [`SchedulerState`] through a watch channel,
//! and observes a [`CancellationToken`] between sessions and while waiting.
//! A session that is already running is never interrupted.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::CheckError;
use crate::interval::CheckInterval;
use crate::session::{CheckOutcome, CheckRequest, CheckSession};

/// Wait between polls of the settings while checks are disabled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    /// Check whenever the interval since the last check has elapsed, forever.
    Periodic,
    /// One silent check.
    OneShot,
    /// One check the user asked for.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Waiting { deadline: DateTime<Utc> },
    Checking,
    Terminating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: CheckInterval,
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: CheckInterval::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePlan {
    Check { then_wait: Duration },
    Wait(Duration),
}

/// Decide what one periodic cycle does.
///
/// `last_check` and `now` are Unix timestamps in seconds; a missing last
/// check counts as the epoch.
#[must_use]
pub fn plan_cycle(
    enabled: bool,
    last_check: Option<i64>,
    now: i64,
    config: &SchedulerConfig,
) -> CyclePlan {
    if !enabled {
        return CyclePlan::Wait(config.poll_interval);
    }

    let interval = config.interval.as_duration();
    let interval_secs = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX);
    let next_check = last_check.unwrap_or(0).saturating_add(interval_secs);

    if now >= next_check {
        CyclePlan::Check {
            then_wait: interval,
        }
    } else {
        let remaining = next_check.saturating_sub(now).unsigned_abs();
        CyclePlan::Wait(Duration::from_secs(remaining))
    }
}

pub type SessionResult = Result<CheckOutcome, CheckError>;

pub struct Scheduler;

impl Scheduler {
    /// Spawn the background task and wait until it reports ready.
    pub async fn start(
        kind: SchedulerKind,
        session: CheckSession,
        config: SchedulerConfig,
    ) -> SchedulerHandle {
        Self::start_with_cancel(kind, session, config, CancellationToken::new()).await
    }

    /// Like [`Scheduler::start`], but stops when `cancel` fires, e.g. a child
    /// of the host's shutdown token. A token that is already cancelled ends
    /// the task before any session runs.
    pub async fn start_with_cancel(
        kind: SchedulerKind,
        session: CheckSession,
        config: SchedulerConfig,
        cancel: CancellationToken,
    ) -> SchedulerHandle {
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker = Worker {
            kind,
            session,
            config,
            cancel: cancel.clone(),
            state: state_tx,
        };
        let task = tokio::spawn(worker.run(ready_tx));
        let ready = ready_rx.await.is_ok();
        debug!("{kind:?} update scheduler started");

        SchedulerHandle {
            kind,
            cancel,
            state: state_rx,
            ready,
            task,
        }
    }
}

pub struct SchedulerHandle {
    kind: SchedulerKind,
    cancel: CancellationToken,
    state: watch::Receiver<SchedulerState>,
    ready: bool,
    task: JoinHandle<Option<SessionResult>>,
}

impl SchedulerHandle {
    #[must_use]
    pub fn kind(&self) -> SchedulerKind {
        self.kind
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Ask the task to stop. Takes effect at the next wait or between
    /// sessions; calling it again has no effect.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to end.
    ///
    /// One-shot and manual schedulers yield the result of their session, or
    /// `None` when cancelled before it started. Periodic schedulers always
    /// yield `None`.
    pub async fn join(self) -> Option<SessionResult> {
        match self.task.await {
            Ok(result) => result,
            Err(error) => Some(Err(CheckError::Unexpected(format!(
                "update scheduler task failed: {error}"
            )))),
        }
    }
}

struct Worker {
    kind: SchedulerKind,
    session: CheckSession,
    config: SchedulerConfig,
    cancel: CancellationToken,
    state: watch::Sender<SchedulerState>,
}

impl Worker {
    async fn run(self, ready: oneshot::Sender<()>) -> Option<SessionResult> {
        let _unwinding = TerminateOnUnwind(&self.state);
        let _ = ready.send(());

        match self.kind {
            SchedulerKind::Periodic => {
                self.run_periodic().await;
                None
            }
            SchedulerKind::OneShot => self.run_once(CheckRequest::background()).await,
            SchedulerKind::Manual => self.run_once(CheckRequest::manual()).await,
        }
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.send_replace(state);
    }

    async fn run_once(&self, request: CheckRequest) -> Option<SessionResult> {
        if self.cancel.is_cancelled() {
            self.set_state(SchedulerState::Terminating);
            return None;
        }

        self.set_state(SchedulerState::Checking);
        let result = self.session.run(request).await;
        self.set_state(SchedulerState::Idle);
        Some(result)
    }

    async fn run_periodic(&self) {
        while !self.cancel.is_cancelled() {
            let settings = self.session.settings();
            let plan = plan_cycle(
                settings.check_for_updates(),
                settings.last_check_time(),
                Utc::now().timestamp(),
                &self.config,
            );

            let wait = match plan {
                CyclePlan::Check { then_wait } => {
                    self.set_state(SchedulerState::Checking);
                    if let Err(error) = self.session.run(CheckRequest::background()).await {
                        warn!("Scheduled update check failed: {error}");
                    }
                    then_wait
                }
                CyclePlan::Wait(wait) => wait,
            };

            if !self.wait(wait).await {
                break;
            }
        }

        debug!("Periodic update scheduler terminating");
        self.set_state(SchedulerState::Terminating);
    }

    /// Returns `false` when woken by cancellation.
    async fn wait(&self, duration: Duration) -> bool {
        let deadline = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.set_state(SchedulerState::Waiting { deadline });
        debug!("Next update check cycle at {deadline}");

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

/// Publishes `Terminating` if the worker unwinds, so observers never see a
/// dead task stuck in `Checking`.
struct TerminateOnUnwind<'a>(&'a watch::Sender<SchedulerState>);

impl Drop for TerminateOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.send_replace(SchedulerState::Terminating);
        }
    }
}
