//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of application logic.

pub mod clock;
pub mod logger;
pub mod writer;

pub use clock::MockClock;
pub use logger::{LogRecord, RecordingLogger};
pub use writer::SharedWriter;
