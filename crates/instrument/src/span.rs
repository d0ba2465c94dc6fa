use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracelab_core::ids::{SpanId, TraceId};
use tracelab_core::model::span::{SpanRecord, SpanStatus};

/// Identity of a live span, passed explicitly to child operations for
/// parent linking. Carrying the context instead of relying on ambient
/// task-local state keeps nesting visible at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

/// Mutable handle injected into a wrapped operation.
///
/// The handle only appends: attributes accumulate, and the first terminal
/// status wins. Finalization is driven by the tracer, exactly once.
#[derive(Clone)]
pub struct SpanHandle {
    ctx: SpanContext,
    state: Arc<Mutex<SpanState>>,
}

struct SpanState {
    name: String,
    op: String,
    parent_span_id: Option<SpanId>,
    attrs: BTreeMap<String, String>,
    status: SpanStatus,
    start_ts: DateTime<Utc>,
    finished: bool,
}

impl SpanHandle {
    pub(crate) fn begin(
        parent: Option<&SpanContext>,
        name: &str,
        op: &str,
        attrs: &[(&str, &str)],
    ) -> Self {
        let trace_id = parent
            .map(|p| p.trace_id.clone())
            .unwrap_or_else(TraceId::generate);
        let ctx = SpanContext {
            trace_id,
            span_id: SpanId::generate(),
        };

        let state = SpanState {
            name: non_empty(name, "unnamed"),
            op: non_empty(op, "custom"),
            parent_span_id: parent.map(|p| p.span_id.clone()),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            status: SpanStatus::Unset,
            start_ts: Utc::now(),
            finished: false,
        };

        Self {
            ctx,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn context(&self) -> SpanContext {
        self.ctx.clone()
    }

    pub fn set_attr(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut state) = self.state.lock()
            && !state.finished
        {
            state.attrs.insert(key.into(), value.into());
        }
    }

    /// Records a terminal status. `Unset` is ignored, and once a terminal
    /// status is recorded, later calls are no-ops.
    pub fn set_status(&self, status: SpanStatus) {
        if !status.is_terminal() {
            return;
        }
        if let Ok(mut state) = self.state.lock()
            && !state.finished
            && !state.status.is_terminal()
        {
            state.status = status;
        }
    }

    pub fn status(&self) -> SpanStatus {
        self.state
            .lock()
            .map(|s| s.status)
            .unwrap_or(SpanStatus::Unset)
    }

    /// Seals the span and produces the record to emit. Returns `None` on
    /// every call after the first, which is what makes emission idempotent.
    ///
    /// An `Error` outcome always wins: a rejected operation is an error
    /// regardless of what status the work recorded. Any other outcome only
    /// applies when the work never set a terminal status itself.
    pub(crate) fn finish(&self, outcome: SpanStatus) -> Option<SpanRecord> {
        let Ok(mut state) = self.state.lock() else {
            return None;
        };
        if state.finished {
            return None;
        }
        state.finished = true;

        let status = if outcome == SpanStatus::Error {
            SpanStatus::Error
        } else if state.status.is_terminal() {
            state.status
        } else {
            outcome
        };
        let end_ts = Utc::now().max(state.start_ts);

        Some(SpanRecord {
            trace_id: self.ctx.trace_id.clone(),
            span_id: self.ctx.span_id.clone(),
            parent_span_id: state.parent_span_id.clone(),
            name: std::mem::take(&mut state.name),
            op: state.op.clone(),
            attrs: std::mem::take(&mut state.attrs),
            status,
            start_ts: state.start_ts,
            end_ts,
        })
    }
}

fn non_empty(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_trace_and_records_parent() {
        let parent = SpanHandle::begin(None, "outer", "demo", &[]);
        let parent_ctx = parent.context();
        let child = SpanHandle::begin(Some(&parent_ctx), "inner", "demo", &[]);

        let record = child.finish(SpanStatus::Ok).unwrap();
        assert_eq!(record.trace_id, parent_ctx.trace_id);
        assert_eq!(record.parent_span_id, Some(parent_ctx.span_id));
    }

    #[test]
    fn first_terminal_status_wins() {
        let handle = SpanHandle::begin(None, "s", "demo", &[]);
        handle.set_status(SpanStatus::Unset);
        assert_eq!(handle.status(), SpanStatus::Unset);

        handle.set_status(SpanStatus::Error);
        handle.set_status(SpanStatus::Ok);
        assert_eq!(handle.status(), SpanStatus::Error);
    }

    #[test]
    fn error_outcome_overrides_recorded_ok() {
        let handle = SpanHandle::begin(None, "s", "demo", &[]);
        handle.set_status(SpanStatus::Ok);
        let record = handle.finish(SpanStatus::Error).unwrap();
        assert_eq!(record.status, SpanStatus::Error);
    }

    #[test]
    fn finish_is_single_shot() {
        let handle = SpanHandle::begin(None, "s", "demo", &[]);
        assert!(handle.finish(SpanStatus::Ok).is_some());
        assert!(handle.finish(SpanStatus::Ok).is_none());
        assert!(handle.finish(SpanStatus::Error).is_none());
    }

    #[test]
    fn mutation_after_finish_is_ignored() {
        let handle = SpanHandle::begin(None, "s", "demo", &[("k", "v")]);
        let record = handle.finish(SpanStatus::Ok).unwrap();
        handle.set_attr("late", "1");
        handle.set_status(SpanStatus::Error);

        assert_eq!(record.attrs.get("k").map(String::as_str), Some("v"));
        assert_eq!(record.status, SpanStatus::Ok);
    }

    #[test]
    fn empty_name_and_op_get_placeholders() {
        let handle = SpanHandle::begin(None, "", "", &[]);
        let record = handle.finish(SpanStatus::Ok).unwrap();
        assert_eq!(record.name, "unnamed");
        assert_eq!(record.op, "custom");
    }
}
