//! Periodic flushing of suppressed occurrences.
//!
//! A single background task drains the registry every interval and hands the
//! resulting summaries to a callback. [`FlushHandle::shutdown`] cancels the
//! task and waits for it to exit.

use crate::application::{ports::Storage, registry::ThrottleRegistry};
use crate::domain::{
    bucket::{FlushSummary, ThrottleBucket},
    key::ThrottleKey,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Error returned when flusher configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlusherConfigError {
    #[error("flush interval must be greater than 0")]
    ZeroInterval,
}

/// Error returned when the flush task did not exit cleanly.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The task panicked, typically because the wrapped logger panicked
    /// while a summary was being forwarded.
    #[error("flush task panicked: {0}")]
    TaskPanicked(#[source] JoinError),
    #[error("flush task was cancelled by the runtime: {0}")]
    TaskCancelled(#[source] JoinError),
}

impl From<JoinError> for ShutdownError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            ShutdownError::TaskPanicked(err)
        } else {
            ShutdownError::TaskCancelled(err)
        }
    }
}

/// Configuration for periodic flushing.
#[derive(Debug, Clone)]
pub struct FlusherConfig {
    /// Time between flushes
    pub interval: Duration,
}

impl Default for FlusherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

impl FlusherConfig {
    /// # Errors
    /// Returns `FlusherConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, FlusherConfigError> {
        if interval.is_zero() {
            return Err(FlusherConfigError::ZeroInterval);
        }
        Ok(Self { interval })
    }
}

/// Drains a registry on a fixed interval.
pub struct Flusher<S>
where
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    registry: ThrottleRegistry<S>,
    config: FlusherConfig,
}

impl<S> Flusher<S>
where
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    pub fn new(registry: ThrottleRegistry<S>, config: FlusherConfig) -> Self {
        Self { registry, config }
    }

    /// Drain the registry once.
    pub fn collect_summaries(&self) -> Vec<FlushSummary> {
        self.registry.drain()
    }

    /// Spawn the flush task on the current tokio runtime.
    ///
    /// The first flush happens one interval after the call. Ticks missed
    /// because a flush ran long are delayed rather than bunched, so flushes
    /// never overlap or fire back to back. Cancellation is only observed
    /// between flushes.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start<F>(self, mut emit_fn: F) -> (FlushHandle, DoneSignal)
    where
        F: FnMut(Vec<FlushSummary>) + Send + 'static,
        S: Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let period = self.config.interval;
        let (done_tx, done_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(target: "throttled_log", interval = ?period, "flush task started");

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let summaries = self.collect_summaries();
                        if !summaries.is_empty() {
                            emit_fn(summaries);
                        }
                    }
                }
            }

            tracing::debug!(target: "throttled_log", "flush task stopped");
            // Dropped on panic instead, which resolves the receiver just the same.
            let _ = done_tx.send(());
        });

        let handle = FlushHandle {
            cancel,
            task: tokio::sync::Mutex::new(Some(task)),
        };
        (handle, DoneSignal { rx: done_rx })
    }

    pub fn config(&self) -> &FlusherConfig {
        &self.config
    }

    pub fn registry(&self) -> &ThrottleRegistry<S> {
        &self.registry
    }
}

/// Controls a running flush task.
///
/// Dropping the handle cancels the task without waiting for it; the
/// [`DoneSignal`] still resolves once the task has exited.
#[derive(Debug)]
pub struct FlushHandle {
    cancel: CancellationToken,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl FlushHandle {
    /// Cancel the task and wait until it has exited.
    ///
    /// A flush already in progress completes first. Later and concurrent
    /// calls wait for the first one to finish and then return `Ok(())`.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let mut task = self.task.lock().await;
        let Some(handle) = task.take() else {
            return Ok(());
        };

        self.cancel.cancel();
        handle.await.map_err(ShutdownError::from)
    }

    /// Whether shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for FlushHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Resolves exactly once, after the flush task has exited.
///
/// The task sends the signal as its last action, or drops it while
/// unwinding if a flush panicked, so no flush can run after this resolves.
#[derive(Debug)]
pub struct DoneSignal {
    rx: oneshot::Receiver<()>,
}

impl DoneSignal {
    /// Non-blocking check.
    pub fn is_done(&mut self) -> bool {
        !matches!(self.rx.try_recv(), Err(oneshot::error::TryRecvError::Empty))
    }
}

impl Future for DoneSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}
