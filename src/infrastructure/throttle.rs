//! Deduplicating logger wrapper.
//!
//! [`ThrottledLogger`] sits in front of any [`Logger`] and collapses repeated
//! `(level, message)` calls: the first call in a window is forwarded as-is,
//! later ones are only counted, and a background task forwards one summary
//! per busy key every interval with a `times` field.

use crate::application::{
    flusher::{DoneSignal, FlushHandle, Flusher, FlusherConfig, FlusherConfigError, ShutdownError},
    metrics::Metrics,
    ports::{Logger, Storage},
    registry::{Observation, ThrottleRegistry},
};
use crate::domain::{
    bucket::{FlushSummary, ThrottleBucket},
    context::Context,
    field::Field,
    key::ThrottleKey,
    level::Level,
};
use crate::infrastructure::storage::ShardedStorage;

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default time between flushes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Error returned when building a [`ThrottledLogger`] fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Flusher configuration validation failed
    #[error("flusher configuration error: {0}")]
    FlusherConfig(#[from] FlusherConfigError),
    /// The flush task needs a tokio runtime to be spawned on
    #[error("no tokio runtime is running on this thread")]
    NoRuntime,
}

/// Builder for constructing a [`ThrottledLogger`].
pub struct ThrottledLoggerBuilder<L> {
    logger: L,
    interval: Duration,
}

impl<L> ThrottledLoggerBuilder<L>
where
    L: Logger + 'static,
{
    /// Set the flush interval.
    ///
    /// The interval will be validated when `build()` is called.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Build the logger and spawn its flush task.
    ///
    /// # Errors
    /// Returns `BuildError` if the interval is zero or no tokio runtime is
    /// available.
    pub fn build(self) -> Result<(ThrottledLogger<L>, DoneSignal), BuildError> {
        ThrottledLogger::with_storage(self.logger, Arc::new(ShardedStorage::new()), self.interval)
    }
}

/// Wrap `logger` with a throttle flushing every `interval`.
///
/// Shorthand for `ThrottledLogger::builder(logger).with_interval(interval).build()`.
///
/// # Errors
/// See [`ThrottledLoggerBuilder::build`].
pub fn throttle<L>(logger: L, interval: Duration) -> Result<(ThrottledLogger<L>, DoneSignal), BuildError>
where
    L: Logger + 'static,
{
    ThrottledLogger::builder(logger).with_interval(interval).build()
}

/// A [`Logger`] that deduplicates calls before forwarding them.
///
/// Calls are keyed on level and message only; fields and context of later
/// calls in a window are dropped, and the summary carries those of the first
/// call. Every level is throttled alike, [`Level::Panic`] included.
///
/// Clones share the same buckets, wrapped logger and flush task.
pub struct ThrottledLogger<L, S = Arc<ShardedStorage<ThrottleKey, ThrottleBucket>>>
where
    L: Logger + 'static,
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    logger: Arc<L>,
    registry: ThrottleRegistry<S>,
    flush: Arc<FlushHandle>,
}

impl<L> ThrottledLogger<L>
where
    L: Logger + 'static,
{
    /// Create a builder for configuring the logger.
    ///
    /// Defaults:
    /// - Flush interval: 1 second
    pub fn builder(logger: L) -> ThrottledLoggerBuilder<L> {
        ThrottledLoggerBuilder {
            logger,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Create a throttle over a custom storage backend.
    ///
    /// # Errors
    /// Returns `BuildError` if the interval is zero or no tokio runtime is
    /// available.
    pub fn with_storage<ST>(
        logger: L,
        storage: ST,
        interval: Duration,
    ) -> Result<(ThrottledLogger<L, ST>, DoneSignal), BuildError>
    where
        ST: Storage<ThrottleKey, ThrottleBucket> + Clone + 'static,
    {
        let config = FlusherConfig::new(interval)?;
        tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let logger = Arc::new(logger);
        let registry = ThrottleRegistry::new(storage, Metrics::new());
        let flusher = Flusher::new(registry.clone(), config);

        let target = Arc::clone(&logger);
        let metrics = registry.metrics().clone();
        let (handle, done) = flusher.start(move |summaries| {
            forward_summaries(target.as_ref(), &metrics, summaries);
        });

        let throttled = ThrottledLogger {
            logger,
            registry,
            flush: Arc::new(handle),
        };
        Ok((throttled, done))
    }
}

impl<L, S> ThrottledLogger<L, S>
where
    L: Logger + 'static,
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    /// Drain every bucket now and forward the summaries.
    ///
    /// Runs the same drain as the background task, on the calling thread.
    pub fn flush(&self) {
        let summaries = self.registry.drain();
        forward_summaries(self.logger.as_ref(), self.registry.metrics(), summaries);
    }

    /// Stop the flush task and wait until it has exited.
    ///
    /// Suppressed occurrences still pending are not flushed; call
    /// [`ThrottledLogger::flush`] afterwards to forward them. Calling `stop`
    /// again, or concurrently from a clone, waits for the first call and
    /// returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush task panicked.
    pub async fn stop(&self) -> Result<(), ShutdownError> {
        self.flush.shutdown().await
    }

    /// Whether [`ThrottledLogger::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.flush.is_cancelled()
    }

    /// Get a reference to the metrics.
    ///
    /// Returns metrics about throttling behavior including:
    /// - Events forwarded
    /// - Events suppressed
    /// - Buckets evicted
    /// - Summaries emitted
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Get the current number of live buckets.
    pub fn bucket_count(&self) -> usize {
        self.registry.len()
    }

    /// The wrapped logger.
    pub fn inner(&self) -> &L {
        &self.logger
    }
}

impl<L, S> Clone for ThrottledLogger<L, S>
where
    L: Logger + 'static,
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            logger: Arc::clone(&self.logger),
            registry: self.registry.clone(),
            flush: Arc::clone(&self.flush),
        }
    }
}

impl<L, S> Debug for ThrottledLogger<L, S>
where
    L: Logger + 'static,
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledLogger")
            .field("buckets", &self.registry.len())
            .field("stopped", &self.flush.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<L, S> Logger for ThrottledLogger<L, S>
where
    L: Logger + 'static,
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    fn log(&self, ctx: &Context, level: Level, message: &str, fields: Vec<Field>) {
        let key = ThrottleKey::new(level, message);
        if self.registry.observe(key, ctx, &fields) == Observation::First {
            self.logger.log(ctx, level, message, fields);
        }
    }

    fn is_debug(&self, ctx: &Context) -> bool {
        self.logger.is_debug(ctx)
    }

    fn dump(&self, message: &str, values: &[&dyn Debug]) {
        self.logger.dump(message, values)
    }
}

fn forward_summaries<L>(logger: &L, metrics: &Metrics, summaries: Vec<FlushSummary>)
where
    L: Logger + ?Sized,
{
    if summaries.is_empty() {
        return;
    }
    metrics.record_summaries(summaries.len() as u64);

    for summary in summaries {
        let key = summary.key.clone();
        let context = summary.context.clone();
        logger.log(&context, key.level(), key.message(), summary.into_fields());
    }
}
