//! Errors with cause chains, structured fields and stack traces.
//!
//! Loggable errors may wrap one prior cause, carry extra structured fields,
//! or carry a formatted stack trace. [`ChainedError`] models those
//! capabilities as explicit variants so the encoder can walk a chain without
//! checking for optional behavior at runtime.
//!
//! ```
//! use throttled_log::{ChainedError, Field};
//!
//! let err = ChainedError::new("connection refused")
//!     .wrap("query failed")
//!     .with_fields(vec![Field::new("table", "users")]);
//!
//! assert_eq!(err.to_string(), "query failed: connection refused");
//! assert_eq!(err.flatten_fields().len(), 1);
//! ```

use crate::domain::field::Field;
use std::backtrace::Backtrace;
use std::fmt;

/// Maximum number of message links followed when walking a cause chain.
///
/// Chains built from [`ChainedError`] are finite by construction, but chains
/// converted from arbitrary `std::error::Error::source()` implementations are
/// not, so every walk stops here. Field and stack-trace links do not count.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// A loggable error.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainedError {
    /// A root error with only a message.
    Plain { message: String },
    /// An error that adds a message on top of a prior cause.
    WithCause {
        message: String,
        cause: Box<ChainedError>,
    },
    /// Attaches structured fields to an error without changing its message.
    WithFields {
        inner: Box<ChainedError>,
        fields: Vec<Field>,
    },
    /// Attaches a formatted stack trace to an error without changing its message.
    WithStackTrace {
        inner: Box<ChainedError>,
        trace: String,
    },
}

impl ChainedError {
    pub fn new(message: impl Into<String>) -> Self {
        ChainedError::Plain {
            message: message.into(),
        }
    }

    /// Wrap `self` as the cause of a new error with `message`.
    pub fn wrap(self, message: impl Into<String>) -> Self {
        ChainedError::WithCause {
            message: message.into(),
            cause: Box::new(self),
        }
    }

    /// Attach structured fields. An empty list returns `self` unchanged.
    pub fn with_fields(self, fields: Vec<Field>) -> Self {
        if fields.is_empty() {
            return self;
        }
        ChainedError::WithFields {
            inner: Box::new(self),
            fields,
        }
    }

    /// Attach an already formatted stack trace.
    pub fn with_stack_trace(self, trace: impl Into<String>) -> Self {
        ChainedError::WithStackTrace {
            inner: Box::new(self),
            trace: trace.into(),
        }
    }

    /// Capture the current thread's backtrace and attach it.
    pub fn with_backtrace(self) -> Self {
        let trace = Backtrace::force_capture().to_string();
        self.with_stack_trace(trace)
    }

    /// Convert any standard error, following `source()` links up to
    /// [`MAX_CHAIN_DEPTH`].
    pub fn from_std(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut messages = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            if messages.len() >= MAX_CHAIN_DEPTH {
                break;
            }
            messages.push(cause.to_string());
            source = cause.source();
        }

        let mut messages = messages.into_iter().rev();
        // The vector always holds the outermost message.
        let root = messages.next().unwrap_or_default();
        messages.fold(ChainedError::new(root), |cause, message| {
            cause.wrap(message)
        })
    }

    /// The message contributed by this link alone.
    ///
    /// Field and stack-trace links are transparent and report their inner
    /// error's message.
    pub fn message(&self) -> &str {
        match self {
            ChainedError::Plain { message } | ChainedError::WithCause { message, .. } => message,
            ChainedError::WithFields { inner, .. } | ChainedError::WithStackTrace { inner, .. } => {
                inner.message()
            }
        }
    }

    fn is_message_link(&self) -> bool {
        matches!(
            self,
            ChainedError::Plain { .. } | ChainedError::WithCause { .. }
        )
    }

    /// The next link in the chain, if any.
    pub fn cause(&self) -> Option<&ChainedError> {
        match self {
            ChainedError::Plain { .. } => None,
            ChainedError::WithCause { cause, .. } => Some(cause),
            ChainedError::WithFields { inner, .. } | ChainedError::WithStackTrace { inner, .. } => {
                Some(inner)
            }
        }
    }

    /// Fields attached directly to this link.
    pub fn own_fields(&self) -> &[Field] {
        match self {
            ChainedError::WithFields { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Stack trace attached directly to this link.
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            ChainedError::WithStackTrace { trace, .. } => Some(trace),
            _ => None,
        }
    }

    /// Iterate the chain from this error inward.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self),
            depth: 0,
        }
    }

    /// The outermost link in the chain carrying a stack trace.
    pub fn find_stack_trace(&self) -> Option<&ChainedError> {
        self.chain().find(|link| link.stack_trace().is_some())
    }

    /// Every structured field in the chain, outermost link first.
    pub fn flatten_fields(&self) -> Vec<&Field> {
        self.chain().flat_map(|link| link.own_fields()).collect()
    }

    /// Multi-line rendering with the innermost message first, each wrapping
    /// message and stack trace following the link it decorates.
    pub fn verbose(&self) -> String {
        let links: Vec<&ChainedError> = self.chain().collect();
        let mut out = String::new();
        for link in links.into_iter().rev() {
            let text = match link {
                ChainedError::Plain { message } | ChainedError::WithCause { message, .. } => {
                    message.as_str()
                }
                ChainedError::WithStackTrace { trace, .. } => trace.trim_end(),
                ChainedError::WithFields { .. } => continue,
            };
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(text);
        }
        out
    }
}

impl fmt::Display for ChainedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for link in self.chain() {
            if let ChainedError::Plain { message } | ChainedError::WithCause { message, .. } = link
            {
                if !first {
                    f.write_str(": ")?;
                }
                f.write_str(message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ChainedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause().map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Iterator over the links of a [`ChainedError`], capped at [`MAX_CHAIN_DEPTH`]
/// message links.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a ChainedError>,
    depth: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a ChainedError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current.is_message_link() {
            if self.depth >= MAX_CHAIN_DEPTH {
                return None;
            }
            self.depth += 1;
        }
        self.next = current.cause();
        Some(current)
    }
}
