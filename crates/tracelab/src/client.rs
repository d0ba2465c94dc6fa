use std::sync::Arc;

use reqwest::StatusCode;
use tracelab_core::model::span::SpanStatus;
use tracelab_core::{Result, TracelabError};
use tracelab_instrument::sinks::{FanoutSink, LogSink, MemorySink};
use tracelab_instrument::{SpanContext, TelemetrySink, Tracer};

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

/// Demo-driver HTTP client. Every request goes through the traced-fetch
/// path, so the client side of each scenario produces its own span tree,
/// kept in a local recorder for printing after the run.
pub struct DemoClient {
    http: reqwest::Client,
    base: String,
    tracer: Tracer,
    recorder: Arc<MemorySink>,
}

impl DemoClient {
    pub fn new(base: impl Into<String>) -> Self {
        let recorder = Arc::new(MemorySink::default());
        let sink: Arc<dyn TelemetrySink> =
            Arc::new(FanoutSink::new(vec![recorder.clone(), Arc::new(LogSink)]));

        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            tracer: Tracer::new(sink),
            recorder,
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn recorder(&self) -> &Arc<MemorySink> {
        &self.recorder
    }

    /// Traced GET. A transport failure rejects; a non-2xx response resolves
    /// normally with the span marked `error` (logical failure) so the
    /// scenario decides what a bad status means.
    pub async fn traced_get(
        &self,
        parent: Option<&SpanContext>,
        path: &str,
    ) -> Result<FetchResult> {
        let url = format!("{}{}", self.base, path);
        let name = format!("GET {path}");

        self.tracer
            .in_span(
                parent,
                &name,
                "http.client",
                &[("http.url", url.as_str())],
                |span| {
                    let http = self.http.clone();
                    let url = url.clone();
                    async move {
                        let response = http
                            .get(&url)
                            .send()
                            .await
                            .map_err(|e| TracelabError::Http(format!("GET {url}: {e}")))?;

                        let status = response.status();
                        span.set_attr("http.status_code", status.as_u16().to_string());
                        if !status.is_success() {
                            span.set_status(SpanStatus::Error);
                        }

                        let body = match response.json::<serde_json::Value>().await {
                            Ok(body) => body,
                            Err(e) => {
                                span.set_attr("body.decode_error", e.to_string());
                                serde_json::Value::Null
                            }
                        };
                        Ok(FetchResult { status, body })
                    }
                },
            )
            .await
    }
}
