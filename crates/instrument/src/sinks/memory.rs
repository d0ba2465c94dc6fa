use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracelab_core::ids::{SpanId, TraceId};
use tracelab_core::model::span::SpanRecord;
use tracelab_core::{Result, TracelabError};

use crate::sink::TelemetrySink;
use crate::span::SpanContext;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapturedException {
    pub ts: DateTime<Utc>,
    pub message: String,
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
}

/// Bounded in-memory sink. Backs the server's span recorder and most tests;
/// oldest entries are evicted once capacity is reached.
pub struct MemorySink {
    capacity: usize,
    spans: RwLock<VecDeque<SpanRecord>>,
    exceptions: RwLock<VecDeque<CapturedException>>,
}

impl MemorySink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            spans: RwLock::new(VecDeque::new()),
            exceptions: RwLock::new(VecDeque::new()),
        }
    }

    /// Finalized spans in emission order (oldest first).
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans
            .read()
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn exceptions(&self) -> Vec<CapturedException> {
        self.exceptions
            .read()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut spans) = self.spans.write() {
            spans.clear();
        }
        if let Ok(mut exceptions) = self.exceptions.write() {
            exceptions.clear();
        }
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::with_capacity(2048)
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&self, span: SpanRecord) -> Result<()> {
        let mut spans = self
            .spans
            .write()
            .map_err(|_| TracelabError::Sink("span recorder lock poisoned".to_string()))?;
        spans.push_back(span);
        while spans.len() > self.capacity {
            spans.pop_front();
        }
        Ok(())
    }

    fn capture_exception(&self, message: &str, ctx: Option<&SpanContext>) -> Result<()> {
        let mut exceptions = self
            .exceptions
            .write()
            .map_err(|_| TracelabError::Sink("exception recorder lock poisoned".to_string()))?;
        exceptions.push_back(CapturedException {
            ts: Utc::now(),
            message: message.to_string(),
            trace_id: ctx.map(|c| c.trace_id.clone()),
            span_id: ctx.map(|c| c.span_id.clone()),
        });
        while exceptions.len() > self.capacity {
            exceptions.pop_front();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tracelab_core::model::span::SpanStatus;

    use super::*;

    fn record(name: &str) -> SpanRecord {
        let now = Utc::now();
        SpanRecord {
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
            parent_span_id: None,
            name: name.to_string(),
            op: "demo".to_string(),
            attrs: BTreeMap::new(),
            status: SpanStatus::Ok,
            start_ts: now,
            end_ts: now,
        }
    }

    #[test]
    fn stores_and_lists_spans() {
        let sink = MemorySink::default();
        sink.emit(record("a")).unwrap();
        sink.emit(record("b")).unwrap();

        let spans = sink.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "a");
        assert_eq!(spans[1].name, "b");
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let sink = MemorySink::with_capacity(2);
        for name in ["a", "b", "c"] {
            sink.emit(record(name)).unwrap();
        }

        let spans = sink.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "b");
        assert_eq!(spans[1].name, "c");
    }

    #[test]
    fn captures_exceptions_with_context() {
        let sink = MemorySink::default();
        let ctx = SpanContext {
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
        };
        sink.capture_exception("boom", Some(&ctx)).unwrap();
        sink.capture_exception("lonely", None).unwrap();

        let exceptions = sink.exceptions();
        assert_eq!(exceptions.len(), 2);
        assert_eq!(exceptions[0].message, "boom");
        assert_eq!(exceptions[0].trace_id, Some(ctx.trace_id));
        assert!(exceptions[1].trace_id.is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let sink = MemorySink::default();
        sink.emit(record("a")).unwrap();
        sink.capture_exception("boom", None).unwrap();
        sink.clear();
        assert!(sink.spans().is_empty());
        assert!(sink.exceptions().is_empty());
    }
}
