//! Field visitor for turning `tracing` fields into log fields.
//!
//! The `message` field becomes the log message; every other field keeps its
//! native type where `tracing` hands one over, and errors are converted into
//! [`ChainedError`]s so the encoder can expand their cause chain.

use crate::domain::error_chain::ChainedError;
use crate::domain::field::Field;
use std::fmt;
use tracing::field::{Field as TracingField, Visit};

const MESSAGE_FIELD: &str = "message";

/// A visitor that collects event or span fields.
#[derive(Debug, Default)]
pub(crate) struct FieldVisitor {
    message: Option<String>,
    fields: Vec<Field>,
}

impl FieldVisitor {
    /// Create a new field visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the visitor and return the message and remaining fields.
    pub fn finish(self) -> (Option<String>, Vec<Field>) {
        (self.message, self.fields)
    }

    /// Consume the visitor and return every field, message included, as text.
    pub fn into_strings(self) -> Vec<(String, String)> {
        self.message
            .map(|message| (MESSAGE_FIELD.to_string(), message))
            .into_iter()
            .chain(
                self.fields
                    .into_iter()
                    .map(|field| (field.key.into_owned(), field.value.to_string())),
            )
            .collect()
    }

    fn push(&mut self, field: &TracingField, value: impl Into<crate::domain::field::FieldValue>) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, value);
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(value.to_string());
        } else {
            self.push(field, value);
        }
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields
            .push(Field::error(field.name(), ChainedError::from_std(value)));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_visitor() {
        let (message, fields) = FieldVisitor::new().finish();
        assert!(message.is_none());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_empty_visitor_strings() {
        assert!(FieldVisitor::new().into_strings().is_empty());
    }
}
