//! # throttled-log
//!
//! Structured logging core: burst deduplication with periodic summaries and a
//! single-line structured encoder.
//!
//! The crate is built around one small trait, [`Logger`], and two pieces
//! that sit on either side of it:
//!
//! - [`ThrottledLogger`] wraps any `Logger` and collapses repeated
//!   `(level, message)` calls. The first call in a window is forwarded
//!   immediately, the rest are only counted, and once per interval a single
//!   summary call carrying a `times` field is forwarded for every message
//!   that repeated.
//! - [`EncodingLogger`] turns calls into lines with an [`Encoder`] and writes
//!   them out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use throttled_log::{keys, throttle, Context, Encoder, EncodingLogger, Field, Logger};
//! use std::time::Duration;
//!
//! # async fn run() {
//! let encoder = Encoder::production([keys::CORRELATION_ID, keys::APP_NAME])
//!     .with_fields(vec![Field::new(keys::APP_NAME, "billing")]);
//! let sink = EncodingLogger::builder(encoder).build();
//!
//! let (logger, done) = throttle(sink, Duration::from_secs(1)).unwrap();
//!
//! let ctx = Context::background().with_value(keys::CORRELATION_ID, "c-42");
//! for _ in 0..5 {
//!     logger.warn(&ctx, "disk full", vec![]);
//! }
//! // One "disk full" line now, one more with `times: 5` about a second later.
//!
//! logger.stop().await.unwrap();
//! done.await;
//! # }
//! ```
//!
//! ## Line Format
//!
//! ```text
//! <timestamp> <LEVEL> [<name> - ]<message> ##<key=value;...>## {"other":"fields"}
//! ```
//!
//! Fields whose key is in the encoder's special-key set are rendered inline
//! between `##<` and `>##`; everything else goes into the JSON object. The
//! marker is always present, `##<>##` when empty. Messages are kept on one
//! line (`\n` and `\r` are escaped) and shortened in the middle once they
//! exceed the byte budget, never splitting a character.
//!
//! ## Errors
//!
//! Error values are logged as [`ChainedError`]s. Without a stack trace
//! anywhere in the chain, an error field renders as the chain's message and
//! every field attached along the chain is added to the line. With one, the
//! field's value becomes the verbose text of the chain (messages and stack
//! traces), escaped inside the JSON so the entry stays on one line. The
//! development preset prints that text after the line instead.
//!
//! ```
//! use throttled_log::{ChainedError, Field};
//!
//! let err = ChainedError::new("this is bad").with_fields(vec![Field::new("big", "boom")]);
//! let field = Field::error("error", err);
//! assert!(field.is_error());
//! ```
//!
//! ## Throttling Semantics
//!
//! - Calls are keyed on level and message only. Fields and context of
//!   suppressed calls are dropped; summaries carry the first call's.
//! - `times` counts every occurrence in the window, including the one
//!   forwarded immediately.
//! - A message that did not repeat during a window is forgotten at the next
//!   flush, so its next occurrence is forwarded immediately again.
//! - Every level is throttled, [`Level::Panic`] included. A sink that
//!   panics on that level panics on the summary line too.
//!
//! ## Observability
//!
//! ```rust,no_run
//! # use throttled_log::{throttle, infrastructure::mocks::RecordingLogger};
//! # async fn run() {
//! # let (logger, _done) = throttle(RecordingLogger::new(), std::time::Duration::from_secs(1)).unwrap();
//! let metrics = logger.metrics().snapshot();
//! println!("Suppression rate: {:.2}%", metrics.suppression_rate() * 100.0);
//! println!("Live buckets: {}", logger.bucket_count());
//! # }
//! ```
//!
//! ## Tracing Integration
//!
//! [`LoggerLayer`] forwards `tracing` events to any `Logger`, so the same
//! stack serves both direct calls and `tracing` macros.

// Domain layer - pure types
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Optional process-wide facade
pub mod global;

// Re-export commonly used types for convenience
pub use domain::{
    bucket::{FlushSummary, ThrottleBucket},
    context::Context,
    entry::LogEntry,
    error_chain::{ChainedError, MAX_CHAIN_DEPTH},
    field::{keys, Field, FieldValue},
    key::ThrottleKey,
    level::Level,
    truncate::truncate,
};

pub use application::{
    flusher::{DoneSignal, FlushHandle, Flusher, FlusherConfig, FlusherConfigError, ShutdownError},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, ContextMapper, Logger, Storage},
    registry::{Observation, ThrottleRegistry},
};

pub use infrastructure::{
    clock::SystemClock,
    encoder::{
        BufferPool, EncodeError, Encoder, EncoderBuildError, EncoderBuilder, PooledBuffer,
        TimeFormat,
    },
    layer::LoggerLayer,
    sink::{ContextValues, EncodingLogger, EncodingLoggerBuilder},
    storage::ShardedStorage,
    throttle::{throttle, BuildError, ThrottledLogger, ThrottledLoggerBuilder},
};

pub use global::{set_global_logger, GlobalLoggerError};
