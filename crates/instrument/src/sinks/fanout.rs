use std::sync::Arc;

use tracelab_core::Result;
use tracelab_core::model::span::SpanRecord;
use tracing::warn;

use crate::sink::TelemetrySink;
use crate::span::SpanContext;

/// Forwards every span and exception to all child sinks. One failing child
/// does not stop delivery to the others.
pub struct FanoutSink {
    children: Vec<Arc<dyn TelemetrySink>>,
}

impl FanoutSink {
    pub fn new(children: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { children }
    }
}

impl TelemetrySink for FanoutSink {
    fn emit(&self, span: SpanRecord) -> Result<()> {
        for child in &self.children {
            if let Err(err) = child.emit(span.clone()) {
                warn!(error = %err, "fanout child sink rejected span");
            }
        }
        Ok(())
    }

    fn capture_exception(&self, message: &str, ctx: Option<&SpanContext>) -> Result<()> {
        for child in &self.children {
            if let Err(err) = child.capture_exception(message, ctx) {
                warn!(error = %err, "fanout child sink rejected exception");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use tracelab_core::TracelabError;
    use tracelab_core::ids::{SpanId, TraceId};
    use tracelab_core::model::span::SpanStatus;

    use super::*;
    use crate::sinks::memory::MemorySink;

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        fn emit(&self, _span: SpanRecord) -> Result<()> {
            Err(TracelabError::Sink("down".to_string()))
        }

        fn capture_exception(&self, _message: &str, _ctx: Option<&SpanContext>) -> Result<()> {
            Err(TracelabError::Sink("down".to_string()))
        }
    }

    #[test]
    fn failing_child_does_not_block_others() {
        let memory = Arc::new(MemorySink::default());
        let fanout = FanoutSink::new(vec![Arc::new(FailingSink), memory.clone()]);

        let now = Utc::now();
        fanout
            .emit(SpanRecord {
                trace_id: TraceId::generate(),
                span_id: SpanId::generate(),
                parent_span_id: None,
                name: "s".to_string(),
                op: "demo".to_string(),
                attrs: BTreeMap::new(),
                status: SpanStatus::Ok,
                start_ts: now,
                end_ts: now,
            })
            .unwrap();
        fanout.capture_exception("boom", None).unwrap();

        assert_eq!(memory.spans().len(), 1);
        assert_eq!(memory.exceptions().len(), 1);
    }
}
