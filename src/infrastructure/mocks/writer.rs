//! In-memory writer for capturing encoded output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A cloneable `io::Write` that appends into a shared buffer.
///
/// Hand one clone to a sink and keep another to inspect what was written.
///
/// ```
/// use throttled_log::infrastructure::mocks::SharedWriter;
/// use std::io::Write;
///
/// let writer = SharedWriter::new();
/// let mut sink = writer.clone();
/// sink.write_all(b"one\ntwo\n").unwrap();
///
/// assert_eq!(writer.lines(), vec!["one", "two"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buffer = self
            .buffer
            .lock()
            .expect("SharedWriter mutex poisoned - a test thread panicked while holding the lock");
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Written output split into lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.buffer
            .lock()
            .expect("SharedWriter mutex poisoned - a test thread panicked while holding the lock")
            .clear();
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("SharedWriter mutex poisoned - a test thread panicked while holding the lock")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
