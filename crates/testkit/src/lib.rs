use std::collections::BTreeMap;

use chrono::{Duration, TimeZone, Utc};
use tracelab_core::ids::{SpanId, TraceId};
use tracelab_core::model::span::{SpanRecord, SpanStatus};

pub fn sample_spans(trace_id: &str) -> Vec<SpanRecord> {
    let trace_id = TraceId::parse(trace_id).expect("valid trace id");
    let root_id = SpanId::parse("00f067aa0ba902b7").expect("valid span id");
    let child_id = SpanId::parse("00f067aa0ba902b8").expect("valid span id");
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

    let mut root_attrs = BTreeMap::new();
    root_attrs.insert("http.method".to_string(), "GET".to_string());
    root_attrs.insert("http.route".to_string(), "/api/slow".to_string());
    root_attrs.insert("http.status_code".to_string(), "200".to_string());

    vec![
        SpanRecord {
            trace_id: trace_id.clone(),
            span_id: root_id.clone(),
            parent_span_id: None,
            name: "GET /api/slow".to_string(),
            op: "http.server".to_string(),
            attrs: root_attrs,
            status: SpanStatus::Ok,
            start_ts: base,
            end_ts: base + Duration::milliseconds(2050),
        },
        SpanRecord {
            trace_id,
            span_id: child_id,
            parent_span_id: Some(root_id),
            name: "waiting-period".to_string(),
            op: "timer".to_string(),
            attrs: BTreeMap::new(),
            status: SpanStatus::Ok,
            start_ts: base + Duration::milliseconds(20),
            end_ts: base + Duration::milliseconds(2020),
        },
    ]
}
