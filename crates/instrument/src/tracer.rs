use std::sync::Arc;

use tracelab_core::model::span::SpanStatus;
use tracing::warn;

use crate::sink::TelemetrySink;
use crate::span::{SpanContext, SpanHandle};

/// Wraps asynchronous operations in spans against a single telemetry sink.
///
/// The wrapper is transparent: whatever the operation returns or fails with
/// is exactly what the caller observes. The only side effect is telemetry,
/// and exactly one span is emitted per invocation, on every exit path.
#[derive(Clone)]
pub struct Tracer {
    sink: Arc<dyn TelemetrySink>,
}

impl Tracer {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> Arc<dyn TelemetrySink> {
        Arc::clone(&self.sink)
    }

    /// Runs `work` inside a span named `name` with category `op`.
    ///
    /// The closure receives a [`SpanHandle`] it may use to append attributes
    /// or force a terminal status; if it never does, the status is inferred
    /// from the outcome. A resolved operation that explicitly set
    /// `SpanStatus::Error` still resolves normally (a logical failure, e.g.
    /// a non-2xx response). A rejected operation has its message attached
    /// as `error.message`, is reported to the sink, and is re-thrown
    /// unchanged; its span finalizes as `error` even if the work recorded
    /// `ok` beforehand.
    ///
    /// Parent linking is explicit: pass the enclosing span's context to nest.
    pub async fn in_span<T, E, F, Fut>(
        &self,
        parent: Option<&SpanContext>,
        name: &str,
        op: &str,
        attrs: &[(&str, &str)],
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(SpanHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let handle = SpanHandle::begin(parent, name, op, attrs);
        let result = work(handle.clone()).await;

        let record = match &result {
            Ok(_) => handle.finish(SpanStatus::Ok),
            Err(err) => {
                let message = err.to_string();
                handle.set_attr("error.message", message.clone());
                let ctx = handle.context();
                if let Err(sink_err) = self.sink.capture_exception(&message, Some(&ctx)) {
                    warn!(error = %sink_err, "telemetry sink rejected exception");
                }
                handle.finish(SpanStatus::Error)
            }
        };

        if let Some(record) = record
            && let Err(sink_err) = self.sink.emit(record)
        {
            warn!(error = %sink_err, "telemetry sink rejected span");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tracelab_core::TracelabError;

    use super::*;
    use crate::sinks::memory::MemorySink;

    #[derive(Debug, PartialEq)]
    struct Boom(String);

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    fn recording_tracer() -> (Tracer, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (Tracer::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn resolves_with_work_value_and_emits_ok() {
        let (tracer, sink) = recording_tracer();

        let out: Result<&str, Boom> = tracer
            .in_span(None, "slow", "timer", &[], |_span| async { Ok("done") })
            .await;

        assert_eq!(out.unwrap(), "done");
        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "slow");
        assert_eq!(spans[0].op, "timer");
        assert_eq!(spans[0].status, SpanStatus::Ok);
        assert!(sink.exceptions().is_empty());
    }

    #[tokio::test]
    async fn rejection_passes_through_unchanged() {
        let (tracer, sink) = recording_tracer();

        let out: Result<(), Boom> = tracer
            .in_span(None, "fail", "demo", &[], |_span| async {
                Err(Boom("boom".to_string()))
            })
            .await;

        assert_eq!(out.unwrap_err(), Boom("boom".to_string()));

        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert_eq!(
            spans[0].attrs.get("error.message").map(String::as_str),
            Some("boom")
        );

        let exceptions = sink.exceptions();
        assert_eq!(exceptions.len(), 1);
        assert_eq!(exceptions[0].message, "boom");
        assert_eq!(exceptions[0].span_id.as_ref(), Some(&spans[0].span_id));
    }

    #[tokio::test]
    async fn rejection_overrides_explicit_ok_status() {
        let (tracer, sink) = recording_tracer();

        let out: Result<(), Boom> = tracer
            .in_span(None, "fail-late", "demo", &[], |span| async move {
                span.set_status(SpanStatus::Ok);
                Err(Boom("late failure".to_string()))
            })
            .await;

        assert_eq!(out.unwrap_err(), Boom("late failure".to_string()));
        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert_eq!(sink.exceptions().len(), 1);
    }

    #[tokio::test]
    async fn logical_failure_resolves_with_error_status() {
        let (tracer, sink) = recording_tracer();

        let out: Result<u16, Boom> = tracer
            .in_span(None, "http GET /x", "http.client", &[], |span| async move {
                span.set_attr("http.status_code", "503");
                span.set_status(SpanStatus::Error);
                Ok(503)
            })
            .await;

        assert_eq!(out.unwrap(), 503);
        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert!(sink.exceptions().is_empty());
    }

    #[tokio::test]
    async fn exactly_one_span_per_invocation() {
        let (tracer, sink) = recording_tracer();

        let _: Result<(), Boom> = tracer
            .in_span(None, "a", "demo", &[], |_| async { Ok(()) })
            .await;
        let _: Result<(), Boom> = tracer
            .in_span(None, "b", "demo", &[], |_| async {
                Err(Boom("x".to_string()))
            })
            .await;

        assert_eq!(sink.spans().len(), 2);
    }

    #[tokio::test]
    async fn nested_span_links_parent_and_finishes_first() {
        let (tracer, sink) = recording_tracer();
        let inner_tracer = tracer.clone();

        let out: Result<&str, TracelabError> = tracer
            .in_span(None, "outer", "demo", &[], |outer| async move {
                let parent = outer.context();
                inner_tracer
                    .in_span(Some(&parent), "inner", "demo", &[], |_| async { Ok("ok") })
                    .await
            })
            .await;

        assert_eq!(out.unwrap(), "ok");
        let spans = sink.spans();
        assert_eq!(spans.len(), 2);

        // Emission order follows finalization order: inner before outer.
        let (inner, outer) = (&spans[0], &spans[1]);
        assert_eq!(inner.name, "inner");
        assert_eq!(outer.name, "outer");
        assert_eq!(inner.trace_id, outer.trace_id);
        assert_eq!(inner.parent_span_id, Some(outer.span_id.clone()));
        assert!(outer.parent_span_id.is_none());
        assert!(inner.end_ts <= outer.end_ts);
    }

    #[tokio::test]
    async fn static_attrs_are_recorded() {
        let (tracer, sink) = recording_tracer();

        let _: Result<(), Boom> = tracer
            .in_span(
                None,
                "tagged",
                "demo",
                &[("http.method", "GET"), ("http.route", "/api/slow")],
                |span| async move {
                    span.set_attr("http.status_code", "200");
                    Ok(())
                },
            )
            .await;

        let spans = sink.spans();
        assert_eq!(
            spans[0].attrs.get("http.method").map(String::as_str),
            Some("GET")
        );
        assert_eq!(
            spans[0].attrs.get("http.status_code").map(String::as_str),
            Some("200")
        );
    }

    #[tokio::test]
    async fn sink_failure_never_masks_work_error() {
        struct FailingSink;

        impl TelemetrySink for FailingSink {
            fn emit(
                &self,
                _span: tracelab_core::model::span::SpanRecord,
            ) -> tracelab_core::Result<()> {
                Err(TracelabError::Sink("emit down".to_string()))
            }

            fn capture_exception(
                &self,
                _message: &str,
                _ctx: Option<&SpanContext>,
            ) -> tracelab_core::Result<()> {
                Err(TracelabError::Sink("capture down".to_string()))
            }
        }

        let tracer = Tracer::new(Arc::new(FailingSink));

        let out: Result<(), Boom> = tracer
            .in_span(None, "fail", "demo", &[], |_| async {
                Err(Boom("real error".to_string()))
            })
            .await;
        assert_eq!(out.unwrap_err(), Boom("real error".to_string()));

        let ok: Result<u8, Boom> = tracer
            .in_span(None, "fine", "demo", &[], |_| async { Ok(7) })
            .await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test]
    async fn slow_work_records_duration() {
        let (tracer, sink) = recording_tracer();

        let out: Result<&str, Boom> = tracer
            .in_span(None, "slow", "timer", &[], |_| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok("done")
            })
            .await;

        assert_eq!(out.unwrap(), "done");
        let spans = sink.spans();
        let duration = spans[0].duration_ms();
        assert!((40..1000).contains(&duration), "duration={duration}ms");
    }

    #[tokio::test]
    async fn concurrent_invocations_do_not_serialize() {
        let (tracer, sink) = recording_tracer();
        let started = Instant::now();

        let calls = (0..12).map(|i| {
            let tracer = tracer.clone();
            async move {
                let name = format!("fanout-{i}");
                let out: Result<usize, Boom> = tracer
                    .in_span(None, &name, "demo", &[], |_| async move {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok(i)
                    })
                    .await;
                out
            }
        });

        let results = futures::future::join_all(calls).await;
        let elapsed = started.elapsed();

        assert!(results.into_iter().all(|r| r.is_ok()));
        assert_eq!(sink.spans().len(), 12);
        // Wall clock tracks the slowest call, not the 360ms sum.
        assert!(elapsed < Duration::from_millis(300), "elapsed={elapsed:?}");
    }
}
