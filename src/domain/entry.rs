//! A single log record as handed to the encoder.

use crate::domain::field::Field;
use crate::domain::level::Level;
use chrono::{DateTime, Utc};

/// One log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger_name: Option<String>,
    pub message: String,
    /// Call-site fields, in the order they were supplied.
    pub fields: Vec<Field>,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            logger_name: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }
}
