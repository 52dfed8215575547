//! Domain layer - pure types with no runtime dependencies.
//!
//! This layer contains the core concepts of the logging core:
//! - Levels, fields, context and log entries
//! - Error chains with fields and stack traces
//! - Throttle keys, buckets and flush summaries
//! - Codepoint-safe truncation
//!
//! All types in this layer are pure and easily testable.

pub mod bucket;
pub mod context;
pub mod entry;
pub mod error_chain;
pub mod field;
pub mod key;
pub mod level;
pub mod truncate;
