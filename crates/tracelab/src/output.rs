use std::collections::BTreeMap;
use std::time::Duration;

use owo_colors::OwoColorize;
use tracelab_core::ids::TraceId;
use tracelab_core::model::span::{SpanRecord, SpanStatus};

pub fn print_spans_human(spans: &[SpanRecord]) {
    if spans.is_empty() {
        println!("no spans recorded");
        return;
    }
    print!("{}", render_span_tree(spans));
}

/// Plain-text span tree, one block per trace, children indented under
/// their parent in start order.
pub fn render_span_tree(spans: &[SpanRecord]) -> String {
    let mut trace_order: Vec<&TraceId> = Vec::new();
    let mut by_trace: BTreeMap<&str, Vec<&SpanRecord>> = BTreeMap::new();
    for span in spans {
        let entry = by_trace.entry(span.trace_id.as_str()).or_default();
        if entry.is_empty() {
            trace_order.push(&span.trace_id);
        }
        entry.push(span);
    }

    let mut out = String::new();
    for trace_id in trace_order {
        let members = &by_trace[trace_id.as_str()];
        let errors = members
            .iter()
            .filter(|s| s.status == SpanStatus::Error)
            .count();
        out.push_str(&format!(
            "TRACE {} spans={} errors={}\n",
            trace_id,
            members.len(),
            errors
        ));

        let mut children: BTreeMap<&str, Vec<&SpanRecord>> = BTreeMap::new();
        let mut roots: Vec<&SpanRecord> = Vec::new();
        for span in members {
            let parent_known = span
                .parent_span_id
                .as_ref()
                .is_some_and(|p| members.iter().any(|s| &s.span_id == p));
            if parent_known {
                children
                    .entry(span.parent_span_id.as_ref().map(|p| p.as_str()).unwrap_or(""))
                    .or_default()
                    .push(span);
            } else {
                roots.push(span);
            }
        }
        roots.sort_by_key(|s| s.start_ts);
        for list in children.values_mut() {
            list.sort_by_key(|s| s.start_ts);
        }

        for root in roots {
            render_node(&mut out, root, &children, 1);
        }
    }
    out
}

fn render_node(
    out: &mut String,
    span: &SpanRecord,
    children: &BTreeMap<&str, Vec<&SpanRecord>>,
    depth: usize,
) {
    out.push_str(&format!(
        "{}{} [{}] {} {}ms\n",
        "  ".repeat(depth),
        span.name,
        span.op,
        span.status,
        span.duration_ms()
    ));
    if let Some(kids) = children.get(span.span_id.as_str()) {
        for kid in kids {
            render_node(out, kid, children, depth + 1);
        }
    }
}

pub fn print_demo_header(title: &str) {
    println!("{}", title.bold().cyan());
}

pub fn print_elapsed(label: &str, elapsed: Duration) {
    println!("  {}: {}", label, format!("{elapsed:.2?}").yellow());
}

pub fn print_ok(message: &str) {
    println!("  {} {message}", "ok".green());
}

pub fn print_failure(message: &str) {
    println!("  {} {message}", "error".red());
}
