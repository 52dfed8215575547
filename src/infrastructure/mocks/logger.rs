//! Mock logger that records every call for later inspection.

use crate::application::ports::Logger;
use crate::domain::context::Context;
use crate::domain::field::{dump_fields, keys, Field, FieldValue};
use crate::domain::level::Level;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// One captured `Logger::log` call.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LogRecord {
    pub context: Context,
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
}

impl LogRecord {
    /// The value of the last field named `key`.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|field| field.key() == key)
            .map(|field| &field.value)
    }

    /// The `times` count attached by a flush, if any.
    pub fn times(&self) -> Option<u64> {
        match self.field(keys::TIMES)? {
            FieldValue::Uint(times) => Some(*times),
            FieldValue::Int(times) => u64::try_from(*times).ok(),
            _ => None,
        }
    }
}

/// Logger that captures calls instead of writing them anywhere.
///
/// Clones share the same record list.
///
/// ```
/// use throttled_log::infrastructure::mocks::RecordingLogger;
/// use throttled_log::{Context, Logger};
///
/// let logger = RecordingLogger::new();
/// logger.info(&Context::background(), "hello", vec![]);
///
/// assert_eq!(logger.count(), 1);
/// assert_eq!(logger.records()[0].message, "hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
    debug: bool,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control what `is_debug` reports and whether `dump` records anything.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Get all captured records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .expect("RecordingLogger mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Get the count of captured records.
    pub fn count(&self) -> usize {
        self.records
            .lock()
            .expect("RecordingLogger mutex poisoned - a test thread panicked while holding the lock")
            .len()
    }

    /// Captured records with the given message.
    pub fn records_for(&self, message: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.message == message)
            .collect()
    }

    /// Clear all captured records.
    pub fn clear(&self) {
        self.records
            .lock()
            .expect("RecordingLogger mutex poisoned - a test thread panicked while holding the lock")
            .clear();
    }
}

impl Logger for RecordingLogger {
    fn log(&self, ctx: &Context, level: Level, message: &str, fields: Vec<Field>) {
        self.records
            .lock()
            .expect("RecordingLogger mutex poisoned - a test thread panicked while holding the lock")
            .push(LogRecord {
                context: ctx.clone(),
                level,
                message: message.to_string(),
                fields,
            });
    }

    fn is_debug(&self, _ctx: &Context) -> bool {
        self.debug
    }

    fn dump(&self, message: &str, values: &[&dyn Debug]) {
        if self.debug {
            self.log(&Context::background(), Level::Debug, message, dump_fields(values));
        }
    }
}
