//! Logger that encodes entries and writes them out.
//!
//! [`EncodingLogger`] is the usual bottom of a logger stack: it turns request
//! context into fields, stamps the entry with the current time, encodes it
//! with an [`Encoder`] and writes the line to any `io::Write`.

use crate::application::ports::{Clock, ContextMapper, Logger};
use crate::domain::{
    context::Context,
    entry::LogEntry,
    field::{dump_fields, Field},
    level::Level,
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::encoder::Encoder;

use std::fmt::{self, Debug};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Maps every context value to a string field of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextValues;

impl ContextMapper for ContextValues {
    fn values(&self, ctx: &Context) -> Vec<(String, String)> {
        ctx.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}

/// Builder for constructing an [`EncodingLogger`].
pub struct EncodingLoggerBuilder<W> {
    encoder: Encoder,
    writer: W,
    min_level: Level,
    clock: Arc<dyn Clock>,
    context_mapper: Arc<dyn ContextMapper>,
    name: Option<String>,
}

impl<W> EncodingLoggerBuilder<W>
where
    W: Write + Send + 'static,
{
    /// Write lines to `writer` instead of stderr.
    pub fn with_writer<W2>(self, writer: W2) -> EncodingLoggerBuilder<W2>
    where
        W2: Write + Send + 'static,
    {
        EncodingLoggerBuilder {
            encoder: self.encoder,
            writer,
            min_level: self.min_level,
            clock: self.clock,
            context_mapper: self.context_mapper,
            name: self.name,
        }
    }

    /// Drop calls below `level`. Debug output is enabled only at
    /// [`Level::Debug`].
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Choose which context values end up as fields.
    pub fn with_context_mapper(mut self, mapper: Arc<dyn ContextMapper>) -> Self {
        self.context_mapper = mapper;
        self
    }

    /// Logger name rendered before each message.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> EncodingLogger<W> {
        EncodingLogger {
            encoder: self.encoder,
            writer: Arc::new(Mutex::new(self.writer)),
            min_level: self.min_level,
            clock: self.clock,
            context_mapper: self.context_mapper,
            name: self.name.map(Arc::from),
        }
    }
}

/// A [`Logger`] writing encoded lines.
///
/// Encoding failures are programming errors and panic. A write failure is
/// reported through `tracing` and the line is lost. [`Level::Panic`] calls
/// panic with the message after the line has been written.
///
/// Clones share the writer.
pub struct EncodingLogger<W = io::Stderr> {
    encoder: Encoder,
    writer: Arc<Mutex<W>>,
    min_level: Level,
    clock: Arc<dyn Clock>,
    context_mapper: Arc<dyn ContextMapper>,
    name: Option<Arc<str>>,
}

impl EncodingLogger {
    /// Create a builder for configuring the logger.
    ///
    /// Defaults:
    /// - Writer: stderr
    /// - Minimum level: debug
    /// - Clock: system clock
    /// - Context mapper: [`ContextValues`]
    pub fn builder(encoder: Encoder) -> EncodingLoggerBuilder<io::Stderr> {
        EncodingLoggerBuilder {
            encoder,
            writer: io::stderr(),
            min_level: Level::Debug,
            clock: Arc::new(SystemClock::new()),
            context_mapper: Arc::new(ContextValues),
            name: None,
        }
    }
}

impl<W> EncodingLogger<W>
where
    W: Write + Send + 'static,
{
    /// A logger whose encoder carries `fields` on every line.
    ///
    /// The new logger shares this one's writer.
    pub fn with_fields<I>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        let mut logger = self.clone();
        logger.encoder = self.encoder.with_fields(fields);
        logger
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    fn write_line(&self, line: &[u8]) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.write_all(line).and_then(|()| writer.flush()) {
            tracing::error!(target: "throttled_log", error = %err, "failed to write log entry");
        }
    }
}

impl<W> Clone for EncodingLogger<W> {
    fn clone(&self) -> Self {
        Self {
            encoder: self.encoder.clone(),
            writer: Arc::clone(&self.writer),
            min_level: self.min_level,
            clock: Arc::clone(&self.clock),
            context_mapper: Arc::clone(&self.context_mapper),
            name: self.name.clone(),
        }
    }
}

impl<W> Debug for EncodingLogger<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingLogger")
            .field("encoder", &self.encoder)
            .field("min_level", &self.min_level)
            .field("context_mapper", &self.context_mapper)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<W> Logger for EncodingLogger<W>
where
    W: Write + Send + 'static,
{
    fn log(&self, ctx: &Context, level: Level, message: &str, mut fields: Vec<Field>) {
        if level < self.min_level {
            return;
        }

        fields.extend(
            self.context_mapper
                .values(ctx)
                .into_iter()
                .map(|(key, value)| Field::new(key, value)),
        );

        let mut entry = LogEntry::new(self.clock.now(), level, message).with_fields(fields);
        entry.logger_name = self.name.as_deref().map(str::to_string);

        match self.encoder.encode_entry(&entry) {
            Ok(Some(line)) => self.write_line(&line),
            Ok(None) => {}
            Err(err) => panic!("failed to encode log entry {:?}: {}", message, err),
        }

        if level == Level::Panic {
            panic!("{}", message);
        }
    }

    fn is_debug(&self, _ctx: &Context) -> bool {
        self.min_level <= Level::Debug
    }

    fn dump(&self, message: &str, values: &[&dyn Debug]) {
        if self.min_level > Level::Debug {
            return;
        }
        self.log(&Context::background(), Level::Debug, message, dump_fields(values));
    }
}
