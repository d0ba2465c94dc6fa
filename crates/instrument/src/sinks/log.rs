use tracelab_core::Result;
use tracelab_core::model::span::SpanRecord;

use crate::sink::TelemetrySink;
use crate::span::SpanContext;

/// Sink that renders spans and exceptions as `tracing` events, for running
/// without a collector. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn emit(&self, span: SpanRecord) -> Result<()> {
        tracing::info!(
            target: "tracelab::span",
            trace = %span.trace_id,
            span = %span.span_id,
            parent = span.parent_span_id.as_ref().map(|p| p.as_str()),
            op = %span.op,
            status = %span.status,
            duration_ms = span.duration_ms(),
            "{}",
            span.name,
        );
        Ok(())
    }

    fn capture_exception(&self, message: &str, ctx: Option<&SpanContext>) -> Result<()> {
        tracing::error!(
            target: "tracelab::exception",
            trace = ctx.map(|c| c.trace_id.as_str()),
            span = ctx.map(|c| c.span_id.as_str()),
            "captured exception: {message}",
        );
        Ok(())
    }
}
