//! Line encoder for log entries.
//!
//! Every entry becomes one line of the form
//!
//! ```text
//! <timestamp> <LEVEL> [<name> - ]<message> ##<key=value;...>## {"other":"fields"}
//! ```
//!
//! An error field whose chain carries a stack trace renders as the chain's
//! verbose text, escaped inside the JSON object; the development preset
//! prints that text on its own lines after the entry instead. Fields whose key is in the configured special-key set are pulled
//! out of the JSON object and rendered inline between `##<` and `>##`, where
//! log shippers can pick them up without parsing JSON.
//!
//! ```
//! use throttled_log::{Encoder, Field, Level, LogEntry};
//! use chrono::{TimeZone, Utc};
//!
//! let encoder = Encoder::production(["correlation_id"]);
//! let entry = LogEntry::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(), Level::Info, "hello world")
//!     .with_fields(vec![
//!         Field::new("correlation_id", "c-1"),
//!         Field::new("world", "earth"),
//!     ]);
//!
//! let line = encoder.encode_entry(&entry).unwrap().unwrap();
//! assert_eq!(
//!     String::from_utf8_lossy(&line),
//!     "2024-01-02T03:04:05Z INFO hello world ##<correlation_id=c-1;>## {\"world\":\"earth\"}\n"
//! );
//! ```

pub mod config;
pub mod pool;

pub use config::{EncoderBuildError, EncoderBuilder, EncoderConfig, TimeFormat};
pub use pool::{BufferPool, PooledBuffer};

use crate::domain::{
    entry::LogEntry,
    field::{Field, FieldValue},
    level::Level,
    truncate::truncate,
};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::{ColoredString, Colorize};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;

/// Error returned when an entry cannot be encoded.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// JSON has no representation for NaN or infinities.
    #[error("field `{key}` holds a non-finite float")]
    NonFiniteFloat { key: String },
    #[error("failed to serialize fields: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write encoded entry: {0}")]
    Io(#[from] io::Error),
}

/// Renders [`LogEntry`] values into lines.
///
/// Cloning is cheap: configuration and the buffer pool are shared, and base
/// fields are copied on the first write to either side, so adding a base
/// field to a clone never shows up in the parent's output. One instance can
/// also be shared between threads.
#[derive(Debug, Clone)]
pub struct Encoder {
    config: Arc<EncoderConfig>,
    base_fields: Arc<Vec<Field>>,
    pool: BufferPool,
}

impl Encoder {
    /// Create a builder for configuring the encoder.
    ///
    /// Defaults:
    /// - Timestamps: RFC 3339, UTC
    /// - Message budget: 500 bytes, shortened with `"..."`
    /// - No special keys, no exclude filters
    /// - Compact JSON, plain level tags
    pub fn builder() -> EncoderBuilder {
        EncoderBuilder::from_config(EncoderConfig::production(BTreeSet::new()))
    }

    /// The production preset with the given special keys.
    pub fn production<I, T>(special_keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let keys = special_keys.into_iter().map(Into::into).collect();
        Self::from_parts(
            Arc::new(EncoderConfig::production(keys)),
            Arc::new(Vec::new()),
            BufferPool::new(),
        )
    }

    /// The development preset: short local-style timestamps, indented
    /// fields, colored levels and no message budget.
    pub fn development() -> Self {
        Self::from_parts(
            Arc::new(EncoderConfig::development()),
            Arc::new(Vec::new()),
            BufferPool::new(),
        )
    }

    /// A builder starting from the development preset, e.g. to add exclude
    /// filters.
    pub fn development_builder() -> EncoderBuilder {
        EncoderBuilder::from_config(EncoderConfig::development())
    }

    pub(crate) fn from_parts(
        config: Arc<EncoderConfig>,
        base_fields: Arc<Vec<Field>>,
        pool: BufferPool,
    ) -> Self {
        Self {
            config,
            base_fields,
            pool,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Fields rendered before the entry's own fields on every line.
    pub fn base_fields(&self) -> &[Field] {
        &self.base_fields
    }

    /// Add a base field to this instance only.
    pub fn add_base_field(&mut self, field: Field) {
        Arc::make_mut(&mut self.base_fields).push(field);
    }

    /// A clone of this encoder with `fields` added to its base fields.
    pub fn with_fields<I>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        let mut encoder = self.clone();
        Arc::make_mut(&mut encoder.base_fields).extend(fields);
        encoder
    }

    /// Pool that encoded lines are drawn from.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Whether `message` matches one of the exclude filters.
    pub fn is_excluded(&self, message: &str) -> bool {
        self.config
            .exclude_filters
            .iter()
            .any(|filter| message.contains(filter.as_str()))
    }

    /// Encode one entry.
    ///
    /// Returns `Ok(None)` when the entry matches an exclude filter.
    ///
    /// # Errors
    /// Returns `EncodeError` when a field value has no JSON representation.
    pub fn encode_entry(&self, entry: &LogEntry) -> Result<Option<PooledBuffer>, EncodeError> {
        if self.is_excluded(&entry.message) {
            return Ok(None);
        }

        let mut buf = self.pool.get();
        self.write_header(&mut buf, entry)?;

        let escaped = escape_message(&entry.message);
        let message = match self.config.max_message_bytes {
            Some(limit) => truncate(&escaped, limit, &self.config.ellipsis),
            None => Cow::Borrowed(escaped.as_ref()),
        };
        buf.extend_from_slice(message.as_bytes());

        let expanded = expand_errors(
            self.base_fields.iter().chain(entry.fields.iter()),
            self.config.trailing_stack_traces,
        );

        buf.extend_from_slice(b" ##<");
        let mut tail = Map::new();
        for (key, value) in expanded.fields {
            if self.config.is_special(key) {
                buf.extend_from_slice(strip_separators(key).as_bytes());
                buf.push(b'=');
                buf.extend_from_slice(strip_separators(&value.to_string()).as_bytes());
                buf.push(b';');
            } else {
                tail.insert(key.to_string(), to_json(key, &value)?);
            }
        }
        buf.extend_from_slice(b">## ");

        if self.config.indent_fields {
            serde_json::to_writer_pretty(&mut *buf, &tail)?;
        } else {
            serde_json::to_writer(&mut *buf, &tail)?;
        }
        buf.push(b'\n');

        for trace in expanded.traces {
            buf.extend_from_slice(trace.as_bytes());
            buf.push(b'\n');
        }

        Ok(Some(buf))
    }

    fn write_header(&self, buf: &mut PooledBuffer, entry: &LogEntry) -> Result<(), EncodeError> {
        match &self.config.time_format {
            TimeFormat::Rfc3339 => buf.extend_from_slice(rfc3339_nano(&entry.timestamp).as_bytes()),
            TimeFormat::Layout(layout) => write!(buf, "{}", entry.timestamp.format(layout))?,
        }
        buf.push(b' ');

        if self.config.colored_levels {
            write!(buf, "{}", colored_level(entry.level))?;
        } else {
            buf.extend_from_slice(entry.level.as_str().as_bytes());
        }
        buf.push(b' ');

        if let Some(name) = entry.logger_name.as_deref().filter(|name| !name.is_empty()) {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b" - ");
        }
        Ok(())
    }
}

/// Fields after error expansion, plus the verbose text of traced errors
/// when those trail the line.
struct Expanded<'a> {
    fields: Vec<(&'a str, Cow<'a, FieldValue>)>,
    traces: Vec<String>,
}

fn expand_errors<'a>(
    fields: impl Iterator<Item = &'a Field>,
    trailing_traces: bool,
) -> Expanded<'a> {
    let mut expanded = Expanded {
        fields: Vec::new(),
        traces: Vec::new(),
    };

    for field in fields {
        match field.value.as_error() {
            Some(err) if err.find_stack_trace().is_some() => {
                if trailing_traces {
                    expanded.traces.push(err.verbose());
                } else {
                    expanded
                        .fields
                        .push((field.key(), Cow::Owned(FieldValue::Str(err.verbose()))));
                }
            }
            Some(err) => {
                expanded
                    .fields
                    .push((field.key(), Cow::Owned(FieldValue::Str(err.to_string()))));
                expanded.fields.extend(
                    err.flatten_fields()
                        .into_iter()
                        .map(|inner| (inner.key(), Cow::Borrowed(&inner.value))),
                );
            }
            None => expanded.fields.push((field.key(), Cow::Borrowed(&field.value))),
        }
    }
    expanded
}

/// RFC 3339 with up to nine fractional digits, trailing zeros dropped.
fn rfc3339_nano(ts: &DateTime<Utc>) -> String {
    let full = ts.to_rfc3339_opts(SecondsFormat::Nanos, true);
    match full.rfind('.') {
        Some(dot) => {
            let fraction = full[dot + 1..full.len() - 1].trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}Z", &full[..dot])
            } else {
                format!("{}.{}Z", &full[..dot], fraction)
            }
        }
        None => full,
    }
}

fn escape_message(message: &str) -> Cow<'_, str> {
    if message.contains(['\n', '\r']) {
        Cow::Owned(message.replace('\n', "\\n").replace('\r', "\\r"))
    } else {
        Cow::Borrowed(message)
    }
}

fn strip_separators(s: &str) -> Cow<'_, str> {
    const SEPARATORS: [char; 4] = [';', '=', '\n', '\r'];
    if s.contains(SEPARATORS) {
        Cow::Owned(s.chars().filter(|c| !SEPARATORS.contains(c)).collect())
    } else {
        Cow::Borrowed(s)
    }
}

fn to_json(key: &str, value: &FieldValue) -> Result<Value, EncodeError> {
    let json = match value {
        FieldValue::Str(s) => Value::String(s.clone()),
        FieldValue::Int(v) => Value::from(*v),
        FieldValue::Uint(v) => Value::from(*v),
        FieldValue::Float(v) => Number::from_f64(*v).map(Value::Number).ok_or_else(|| {
            EncodeError::NonFiniteFloat {
                key: key.to_string(),
            }
        })?,
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::Json(v) => v.clone(),
        FieldValue::Error(err) => Value::String(err.to_string()),
    };
    Ok(json)
}

fn colored_level(level: Level) -> ColoredString {
    let tag = level.as_str();
    match level {
        Level::Debug => tag.magenta(),
        Level::Info => tag.blue(),
        Level::Warn => tag.yellow(),
        Level::Error | Level::Panic => tag.red(),
    }
}
