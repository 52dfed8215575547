//! Process-wide logger facade.
//!
//! Prefer passing a [`Logger`] to the components that need one; these free
//! functions exist for call sites where threading a logger through is not
//! practical. The global logger can be set once per process, and every call
//! made before that is silently dropped.
//!
//! ```
//! use throttled_log::global;
//! use throttled_log::Context;
//! use throttled_log::infrastructure::mocks::RecordingLogger;
//!
//! let recorder = RecordingLogger::new();
//! global::set_global_logger(recorder.clone()).unwrap();
//!
//! global::info(&Context::background(), "hello world", vec![]);
//! assert_eq!(recorder.count(), 1);
//! ```

use crate::application::ports::Logger;
use crate::domain::{context::Context, field::Field, level::Level};
use std::fmt::Debug;
use std::sync::OnceLock;
use thiserror::Error;

static GLOBAL: OnceLock<Box<dyn Logger>> = OnceLock::new();

/// Error returned when the global logger is set twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobalLoggerError {
    #[error("the global logger has already been set")]
    AlreadySet,
}

/// Install the process-wide logger.
///
/// # Errors
/// Returns `GlobalLoggerError::AlreadySet` if a logger was installed before;
/// the existing logger stays in place.
pub fn set_global_logger<L>(logger: L) -> Result<(), GlobalLoggerError>
where
    L: Logger + 'static,
{
    GLOBAL
        .set(Box::new(logger))
        .map_err(|_| GlobalLoggerError::AlreadySet)
}

/// The installed logger, if any.
pub fn global_logger() -> Option<&'static dyn Logger> {
    GLOBAL.get().map(|logger| logger.as_ref())
}

pub fn log(ctx: &Context, level: Level, message: &str, fields: Vec<Field>) {
    if let Some(logger) = global_logger() {
        logger.log(ctx, level, message, fields);
    }
}

pub fn debug(ctx: &Context, message: &str, fields: Vec<Field>) {
    log(ctx, Level::Debug, message, fields);
}

pub fn info(ctx: &Context, message: &str, fields: Vec<Field>) {
    log(ctx, Level::Info, message, fields);
}

pub fn warn(ctx: &Context, message: &str, fields: Vec<Field>) {
    log(ctx, Level::Warn, message, fields);
}

pub fn error(ctx: &Context, message: &str, fields: Vec<Field>) {
    log(ctx, Level::Error, message, fields);
}

/// Log at [`Level::Panic`]. Whether this panics is up to the installed logger.
pub fn panic(ctx: &Context, message: &str, fields: Vec<Field>) {
    log(ctx, Level::Panic, message, fields);
}

/// `false` while no logger is installed.
pub fn is_debug(ctx: &Context) -> bool {
    global_logger().is_some_and(|logger| logger.is_debug(ctx))
}

pub fn dump(message: &str, values: &[&dyn Debug]) {
    if let Some(logger) = global_logger() {
        logger.dump(message, values);
    }
}
