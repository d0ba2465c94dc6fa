use tracelab_core::Result;
use tracelab_core::model::span::SpanRecord;

use crate::span::SpanContext;

/// Destination for finalized spans and captured exceptions.
///
/// Implementations may fail; the tracer treats every sink failure as
/// non-fatal and never lets it reach the wrapped operation's caller.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, span: SpanRecord) -> Result<()>;

    fn capture_exception(&self, message: &str, ctx: Option<&SpanContext>) -> Result<()>;
}
