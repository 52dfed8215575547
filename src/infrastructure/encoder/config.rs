//! Encoder configuration and its builder.

use crate::infrastructure::encoder::{pool::BufferPool, Encoder};
use chrono::format::{Item, StrftimeItems};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Default byte budget for a rendered message.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 500;

/// Default marker inserted where a message was shortened.
pub const DEFAULT_ELLIPSIS: &str = "...";

/// strftime layout used by [`Encoder::development`].
pub const DEVELOPMENT_TIME_LAYOUT: &str = "%H:%M:%S%.6f";

/// Error returned when building an [`Encoder`] fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderBuildError {
    #[error("invalid time layout `{layout}`")]
    InvalidTimeLayout { layout: String },
    #[error("message budget of {budget} bytes cannot hold the ellipsis `{ellipsis}`")]
    BudgetTooSmall { budget: usize, ellipsis: String },
}

/// How the timestamp at the start of each line is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeFormat {
    /// RFC 3339 in UTC with nanoseconds, trailing zeros trimmed.
    Rfc3339,
    /// A strftime layout, validated at build time.
    Layout(String),
}

/// Immutable settings shared by an encoder and all of its clones.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub(crate) time_format: TimeFormat,
    pub(crate) indent_fields: bool,
    pub(crate) exclude_filters: Vec<String>,
    pub(crate) special_keys: BTreeSet<String>,
    pub(crate) max_message_bytes: Option<usize>,
    pub(crate) ellipsis: String,
    pub(crate) colored_levels: bool,
    pub(crate) trailing_stack_traces: bool,
}

impl EncoderConfig {
    pub fn time_format(&self) -> &TimeFormat {
        &self.time_format
    }

    pub fn indent_fields(&self) -> bool {
        self.indent_fields
    }

    pub fn exclude_filters(&self) -> &[String] {
        &self.exclude_filters
    }

    pub fn is_special(&self, key: &str) -> bool {
        self.special_keys.contains(key)
    }

    /// `None` when messages are never shortened.
    pub fn max_message_bytes(&self) -> Option<usize> {
        self.max_message_bytes
    }

    pub fn ellipsis(&self) -> &str {
        &self.ellipsis
    }

    pub fn colored_levels(&self) -> bool {
        self.colored_levels
    }

    /// Whether traced errors follow the line instead of filling their field.
    pub fn trailing_stack_traces(&self) -> bool {
        self.trailing_stack_traces
    }

    pub(crate) fn production(special_keys: BTreeSet<String>) -> Self {
        Self {
            time_format: TimeFormat::Rfc3339,
            indent_fields: false,
            exclude_filters: Vec::new(),
            special_keys,
            max_message_bytes: Some(DEFAULT_MAX_MESSAGE_BYTES),
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
            colored_levels: false,
            trailing_stack_traces: false,
        }
    }

    pub(crate) fn development() -> Self {
        Self {
            time_format: TimeFormat::Layout(DEVELOPMENT_TIME_LAYOUT.to_string()),
            indent_fields: true,
            exclude_filters: Vec::new(),
            special_keys: BTreeSet::new(),
            max_message_bytes: None,
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
            colored_levels: true,
            trailing_stack_traces: true,
        }
    }
}

/// Builder for constructing an [`Encoder`].
#[derive(Debug, Clone)]
pub struct EncoderBuilder {
    config: EncoderConfig,
}

impl EncoderBuilder {
    pub(crate) fn from_config(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Render timestamps with a strftime layout instead of RFC 3339.
    ///
    /// The layout is validated when `build()` is called.
    pub fn with_time_layout(mut self, layout: impl Into<String>) -> Self {
        self.config.time_format = TimeFormat::Layout(layout.into());
        self
    }

    /// Pretty-print the JSON field tail.
    pub fn with_indent_fields(mut self, indent: bool) -> Self {
        self.config.indent_fields = indent;
        self
    }

    /// Drop every entry whose message contains one of `filters`.
    pub fn with_exclude_filters<I, T>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.config
            .exclude_filters
            .extend(filters.into_iter().map(Into::into));
        self
    }

    /// Fields with these keys render inline between `##<` and `>##`.
    ///
    /// Common picks are in [`crate::domain::field::keys`].
    pub fn with_special_keys<I, T>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.config
            .special_keys
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Shorten messages longer than `limit` bytes.
    ///
    /// Must leave room for the ellipsis; checked when `build()` is called.
    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.config.max_message_bytes = Some(limit);
        self
    }

    /// Never shorten messages.
    pub fn with_unlimited_message(mut self) -> Self {
        self.config.max_message_bytes = None;
        self
    }

    /// Marker inserted where a message was shortened.
    pub fn with_ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.config.ellipsis = ellipsis.into();
        self
    }

    /// Colorize the level tag for terminals.
    ///
    /// Coloring still follows `colored`'s global switch, so it is dropped
    /// when output is not a terminal or `NO_COLOR` is set.
    pub fn with_colored_levels(mut self, colored: bool) -> Self {
        self.config.colored_levels = colored;
        self
    }

    /// Print the verbose text of errors carrying a stack trace on their own
    /// lines after the entry, instead of as the error field's value.
    ///
    /// Output is no longer one line per entry when enabled.
    pub fn with_trailing_stack_traces(mut self, trailing: bool) -> Self {
        self.config.trailing_stack_traces = trailing;
        self
    }

    /// Build the encoder.
    ///
    /// # Errors
    /// Returns `EncoderBuildError` if the time layout does not parse or the
    /// message budget cannot hold the ellipsis.
    pub fn build(self) -> Result<Encoder, EncoderBuildError> {
        if let TimeFormat::Layout(layout) = &self.config.time_format {
            if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
                return Err(EncoderBuildError::InvalidTimeLayout {
                    layout: layout.clone(),
                });
            }
        }

        if let Some(budget) = self.config.max_message_bytes {
            if budget <= self.config.ellipsis.len() {
                return Err(EncoderBuildError::BudgetTooSmall {
                    budget,
                    ellipsis: self.config.ellipsis,
                });
            }
        }

        Ok(Encoder::from_parts(
            Arc::new(self.config),
            Arc::new(Vec::new()),
            BufferPool::new(),
        ))
    }
}
