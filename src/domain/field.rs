//! Structured key/value fields attached to log calls.

use crate::domain::error_chain::ChainedError;
use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Well-known field keys shared across services.
pub mod keys {
    pub const APP_NAME: &str = "app_name";
    pub const APP_VERSION: &str = "app_version";
    pub const CORRELATION_ID: &str = "correlation_id";
    pub const WORKFLOW_ID: &str = "workflow_id";
    /// Appended by the throttle to summarized entries.
    pub const TIMES: &str = "times";
}

/// The value half of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Arbitrary structured value, rendered as-is in the JSON tail.
    Json(serde_json::Value),
    /// An error whose cause chain is expanded by the encoder.
    Error(Arc<ChainedError>),
}

impl FieldValue {
    /// Returns the error if this value holds one.
    pub fn as_error(&self) -> Option<&ChainedError> {
        match self {
            FieldValue::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Uint(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Json(v) => write!(f, "{}", v),
            FieldValue::Error(err) => write!(f, "{}", err),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Str(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Uint(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Uint(value.into())
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Uint(value as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Json(value)
    }
}

impl From<ChainedError> for FieldValue {
    fn from(err: ChainedError) -> Self {
        FieldValue::Error(Arc::new(err))
    }
}

impl From<Arc<ChainedError>> for FieldValue {
    fn from(err: Arc<ChainedError>) -> Self {
        FieldValue::Error(err)
    }
}

/// A single structured field.
///
/// Keys are `Cow<'static, str>` so the common case of literal keys never
/// allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Shorthand for an error-valued field.
    pub fn error(key: impl Into<Cow<'static, str>>, err: impl Into<Arc<ChainedError>>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Error(err.into()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_error(&self) -> bool {
        matches!(self.value, FieldValue::Error(_))
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<Cow<'static, str>>,
    V: Into<FieldValue>,
{
    fn from((key, value): (K, V)) -> Self {
        Field::new(key, value)
    }
}

/// Turn `dump` arguments into `arg0..argN` fields holding their debug output.
pub fn dump_fields(values: &[&dyn Debug]) -> Vec<Field> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| Field::new(format!("arg{}", i), format!("{:?}", value)))
        .collect()
}
