//! Task orchestration façade.
//!
//! [`TaskClient`] wraps a [`ProviderAdapter`] and drives submitted tasks to a
//! terminal outcome without the caller managing timers. One
//! [`poll_until_done`](TaskClient::poll_until_done) call owns exactly one
//! pending timer at any moment, rescheduled only after the previous
//! iteration's fetch has settled, so in-flight requests per poll are bounded
//! to one. Independent polls never share mutable state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::adapter::ProviderAdapter;
use crate::error::Error;
use crate::params::TaskParams;
use crate::providers::hunyuan::{HunyuanAdapter, HunyuanConfig};
use crate::providers::tripo::{TripoAdapter, TripoConfig};
use crate::types::{ErrorCode, Provider, Task, TaskKind, TaskStatus};
use crate::utils::cancel::CancelHandle;

/// Growth factor applied to the backoff interval after each consecutive
/// transient fetch failure.
const BACKOFF_GROWTH: f64 = 1.5;

/// Ceiling for the error backoff interval.
const BACKOFF_CEILING: Duration = Duration::from_millis(15_000);

/// Broadcast buffer for client-level progress observers. Slow observers lag
/// rather than block the poll.
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Callback invoked with every fresh task snapshot during a poll.
pub type ProgressCallback = Arc<dyn Fn(&Task) + Send + Sync>;

/// Options for one [`TaskClient::poll_until_done`] call.
#[derive(Clone)]
pub struct PollOptions {
    /// Steady-state delay between successful status fetches.
    pub interval: Duration,
    /// Wall-clock budget for the whole poll. Checked at loop top, so actual
    /// overrun is bounded by roughly one interval (or one backoff) past the
    /// budget; that bound is inherent to timer-based polling.
    pub timeout: Duration,
    /// Consecutive transient fetch failures tolerated before giving up.
    pub max_retries: u32,
    /// Per-call progress callback; the client-level broadcast channel fires
    /// regardless of whether this is set.
    pub on_progress: Option<ProgressCallback>,
    /// Caller-driven cancellation.
    pub cancel: Option<CancelHandle>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3_000),
            timeout: Duration::from_millis(300_000),
            max_retries: 5,
            on_progress: None,
            cancel: None,
        }
    }
}

impl std::fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollOptions")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("on_progress", &self.on_progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl PollOptions {
    /// Set the steady-state polling interval.
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the wall-clock budget.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the consecutive transient-error budget.
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set a per-call progress callback.
    pub fn with_on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Attach a cancellation handle.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Ephemeral state of one poll. Owned exclusively by the call that created it.
struct PollSession {
    started: Instant,
    backoff: Duration,
    consecutive_errors: u32,
}

/// The orchestration façade: task creation, single-status fetch, and the
/// polling driver.
#[derive(Clone)]
pub struct TaskClient {
    adapter: Arc<dyn ProviderAdapter>,
    progress_tx: broadcast::Sender<Task>,
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("provider", &self.adapter.provider())
            .finish()
    }
}

impl TaskClient {
    /// Wrap an adapter.
    pub fn new(adapter: Arc<dyn ProviderAdapter>) -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            adapter,
            progress_tx,
        }
    }

    /// Client backed by the Tripo adapter.
    pub fn tripo(config: TripoConfig) -> Result<Self, Error> {
        Ok(Self::new(Arc::new(TripoAdapter::new(config)?)))
    }

    /// Client backed by the Hunyuan adapter.
    pub fn hunyuan(config: HunyuanConfig) -> Result<Self, Error> {
        Ok(Self::new(Arc::new(HunyuanAdapter::new(config)?)))
    }

    /// Which vendor the underlying adapter talks to.
    pub fn provider(&self) -> Provider {
        self.adapter.provider()
    }

    /// Whether the underlying adapter supports `kind`.
    pub fn supports(&self, kind: TaskKind) -> bool {
        self.adapter.supports(kind)
    }

    /// Subscribe to every successful status fetch made through this client,
    /// independent of which caller initiated the poll.
    pub fn subscribe(&self) -> broadcast::Receiver<Task> {
        self.progress_tx.subscribe()
    }

    /// Submit a task. A single attempt: no retry, no backoff; errors
    /// propagate as-is.
    pub async fn create_task(&self, params: TaskParams) -> Result<String, Error> {
        self.adapter.create_task(params).await
    }

    /// One unconditional status fetch.
    pub async fn get_task(&self, task_id: &str) -> Result<Task, Error> {
        self.adapter.get_task_status(task_id).await
    }

    /// Repeatedly fetch status until the task reaches a terminal state, the
    /// wall-clock budget elapses, or consecutive transient failures exceed
    /// the retry budget.
    ///
    /// The first fetch happens immediately; subsequent fetches are scheduled
    /// `interval` apart while the vendor keeps responding, and backoff-spaced
    /// (×1.5, capped at 15 s) while fetches keep failing.
    pub async fn poll_until_done(
        &self,
        task_id: &str,
        options: PollOptions,
    ) -> Result<Task, Error> {
        let mut session = PollSession {
            started: Instant::now(),
            backoff: options.interval,
            consecutive_errors: 0,
        };

        loop {
            // Loop-top timeout check: a slow vendor response cannot push the
            // overrun past roughly one interval beyond the budget.
            let elapsed = session.started.elapsed();
            if elapsed > options.timeout {
                return Err(Error::Timeout {
                    task_id: task_id.to_string(),
                    timeout_ms: options.timeout.as_millis() as u64,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }

            match self.fetch(task_id, options.cancel.as_ref()).await? {
                Ok(task) => {
                    session.consecutive_errors = 0;
                    session.backoff = options.interval;

                    let _ = self.progress_tx.send(task.clone());
                    if let Some(callback) = &options.on_progress {
                        callback(&task);
                    }
                    debug!(
                        task_id = %task.id,
                        status = %task.status,
                        progress = task.progress,
                        "task snapshot"
                    );

                    match task.status {
                        TaskStatus::Succeeded => return Ok(task),
                        TaskStatus::Failed => return Err(Self::task_failed(task)),
                        TaskStatus::Canceled => {
                            return Err(Error::TaskCanceled {
                                task: Box::new(task),
                            });
                        }
                        TaskStatus::Pending | TaskStatus::Processing => {
                            self.wait(options.interval, options.cancel.as_ref(), task_id)
                                .await?;
                        }
                    }
                }
                Err(err) => {
                    session.consecutive_errors += 1;
                    if session.consecutive_errors >= options.max_retries {
                        return Err(Error::MaxRetriesExceeded {
                            task_id: task_id.to_string(),
                            attempts: session.consecutive_errors,
                            last_error: err.to_string(),
                        });
                    }
                    session.backoff = session
                        .backoff
                        .mul_f64(BACKOFF_GROWTH)
                        .min(BACKOFF_CEILING);
                    warn!(
                        task_id,
                        consecutive_errors = session.consecutive_errors,
                        backoff_ms = session.backoff.as_millis() as u64,
                        error = %err,
                        "status fetch failed, backing off"
                    );
                    self.wait(session.backoff, options.cancel.as_ref(), task_id)
                        .await?;
                }
            }
        }
    }

    /// One cancellation-aware status fetch.
    ///
    /// The outer `Result` carries non-retryable conditions (cancellation,
    /// caller errors); the inner one feeds the transient-error budget.
    async fn fetch(
        &self,
        task_id: &str,
        cancel: Option<&CancelHandle>,
    ) -> Result<Result<Task, Error>, Error> {
        let fetched = match cancel {
            Some(handle) => tokio::select! {
                _ = handle.cancelled() => {
                    return Err(Error::PollAborted {
                        task_id: task_id.to_string(),
                    });
                }
                result = self.adapter.get_task_status(task_id) => result,
            },
            None => self.adapter.get_task_status(task_id).await,
        };
        match fetched {
            Ok(task) => Ok(Ok(task)),
            Err(err) if err.is_transient() => Ok(Err(err)),
            Err(err) => Err(err),
        }
    }

    async fn wait(
        &self,
        delay: Duration,
        cancel: Option<&CancelHandle>,
        task_id: &str,
    ) -> Result<(), Error> {
        match cancel {
            Some(handle) => tokio::select! {
                _ = handle.cancelled() => Err(Error::PollAborted {
                    task_id: task_id.to_string(),
                }),
                _ = sleep(delay) => Ok(()),
            },
            None => {
                sleep(delay).await;
                Ok(())
            }
        }
    }

    fn task_failed(task: Task) -> Error {
        let (code, message) = match &task.error {
            Some(error) => (error.code.clone(), error.message.clone()),
            // Adapters populate `error` on every Failed snapshot; this arm is
            // a safety net for a misbehaving adapter.
            None => (
                ErrorCode::GenerationFailed,
                "the task failed without a vendor error".to_string(),
            ),
        };
        Error::TaskFailed {
            code,
            message,
            task: Box::new(task),
        }
    }
}
