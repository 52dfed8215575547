//! Tracing integration layer.
//!
//! Provides a `tracing_subscriber::Layer` that forwards `tracing` events to a
//! [`Logger`], so code instrumented with `tracing` macros ends up in the same
//! throttled, encoded output as direct logger calls.
//!
//! Fields recorded on enclosing spans become [`Context`] values of the
//! forwarded call, innermost span winning on duplicate names. The event's
//! target is used as the `target` field unless disabled.
//!
//! ```rust,no_run
//! use throttled_log::{Encoder, EncodingLogger, LoggerLayer};
//! use tracing_subscriber::prelude::*;
//!
//! let sink = EncodingLogger::builder(Encoder::production(["correlation_id"])).build();
//! tracing_subscriber::registry()
//!     .with(LoggerLayer::new(sink))
//!     .init();
//!
//! tracing::info!(world = "earth", "hello world");
//! ```

use crate::application::ports::Logger;
use crate::domain::{context::Context, field::Field, level::Level};
use crate::infrastructure::visitor::FieldVisitor;

use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::layer::Context as LayerContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Span fields stored in span extensions by [`LoggerLayer::on_new_span`].
#[derive(Debug, Clone, Default)]
struct SpanValues(Vec<(String, String)>);

/// A `tracing` layer that forwards every event to a [`Logger`].
///
/// Clones share the wrapped logger.
#[derive(Debug)]
pub struct LoggerLayer<L> {
    logger: Arc<L>,
    with_target: bool,
    with_span_values: bool,
}

impl<L> LoggerLayer<L>
where
    L: Logger + 'static,
{
    /// Create a layer forwarding to `logger`.
    ///
    /// Defaults:
    /// - Target field: enabled
    /// - Span fields as context: enabled
    pub fn new(logger: L) -> Self {
        Self::from_arc(Arc::new(logger))
    }

    /// Create a layer forwarding to a logger that is also used elsewhere.
    pub fn from_arc(logger: Arc<L>) -> Self {
        Self {
            logger,
            with_target: true,
            with_span_values: true,
        }
    }

    /// Add the event target as a `target` field.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Turn fields of enclosing spans into context values.
    pub fn with_span_values(mut self, enabled: bool) -> Self {
        self.with_span_values = enabled;
        self
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Build a context from the current span scope, outermost span first.
    fn span_context<S>(&self, event: &tracing::Event<'_>, cx: &LayerContext<'_, S>) -> Context
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        let mut ctx = Context::background();
        if !self.with_span_values {
            return ctx;
        }

        if let Some(scope) = cx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(SpanValues(values)) = extensions.get::<SpanValues>() {
                    for (key, value) in values {
                        ctx = ctx.with_value(key.as_str(), value.as_str());
                    }
                }
            }
        }
        ctx
    }
}

impl<L> Clone for LoggerLayer<L> {
    fn clone(&self) -> Self {
        Self {
            logger: Arc::clone(&self.logger),
            with_target: self.with_target,
            with_span_values: self.with_span_values,
        }
    }
}

impl<L, S> Layer<S> for LoggerLayer<L>
where
    L: Logger + 'static,
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: LayerContext<'_, S>,
    ) {
        if !self.with_span_values {
            return;
        }

        let mut visitor = FieldVisitor::new();
        attrs.record(&mut visitor);
        let values = visitor.into_strings();
        if values.is_empty() {
            return;
        }

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanValues(values));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, cx: LayerContext<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);
        let (message, mut fields) = visitor.finish();
        let message = message.unwrap_or_else(|| metadata.name().to_string());

        if self.with_target {
            fields.push(Field::new("target", metadata.target()));
        }

        let ctx = self.span_context(event, &cx);
        self.logger
            .log(&ctx, Level::from(*metadata.level()), &message, fields);
    }
}
