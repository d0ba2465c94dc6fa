use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SpanId, TraceId};

/// Terminal outcome of a traced unit of work. `Unset` survives only until
/// finalization; an emitted record always carries `Ok` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    Unset,
    Ok,
    Error,
}

impl SpanStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unset => "UNSET",
            Self::Ok => "OK",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// A finalized span as emitted to the telemetry sink. Records are immutable
/// once emitted; mutation happens only through the live span handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpanRecord {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub name: String,
    pub op: String,
    pub attrs: BTreeMap<String, String>,
    pub status: SpanStatus,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

impl SpanRecord {
    pub fn duration_ms(&self) -> i64 {
        (self.end_ts - self.start_ts).num_milliseconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn duration_clamps_to_zero() {
        let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let record = SpanRecord {
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
            parent_span_id: None,
            name: "t".to_string(),
            op: "timer".to_string(),
            attrs: BTreeMap::new(),
            status: SpanStatus::Ok,
            start_ts: base,
            end_ts: base - chrono::Duration::milliseconds(5),
        };
        assert_eq!(record.duration_ms(), 0);
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&SpanStatus::Error).unwrap(),
            "\"ERROR\""
        );
        assert_eq!(SpanStatus::Ok.to_string(), "OK");
    }
}
