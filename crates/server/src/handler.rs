use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracelab_core::TracelabError;
use tracelab_core::model::span::SpanStatus;
use tracelab_instrument::SpanHandle;

use crate::state::AppState;

/// Set by a handler the moment it has committed output to the client.
/// The wrapper checks it before writing the fallback error body, so a
/// failure after the fact cannot double-handle the response.
#[derive(Clone, Default)]
pub struct ResponseSent(Arc<AtomicBool>);

impl ResponseSent {
    pub fn mark(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Adapts a scenario handler to the traced-operation wrapper.
///
/// Opens the request root span (`http.server`), hands the handler the span
/// plus a [`ResponseSent`] token, records the response status, and converts
/// a failure into a 500 JSON body. 5xx responses mark the span `error`; a
/// 4xx is a logical miss and leaves the inferred status alone.
pub async fn wrap_handler<F, Fut>(
    state: AppState,
    method: Method,
    route: &str,
    work: F,
) -> Response
where
    F: FnOnce(SpanHandle, ResponseSent) -> Fut,
    Fut: Future<Output = Result<Response, TracelabError>>,
{
    let name = format!("{method} {route}");
    let method_label = method.to_string();
    let sent = ResponseSent::default();
    let sent_inner = sent.clone();

    let out: Result<Response, TracelabError> = state
        .tracer
        .in_span(
            None,
            &name,
            "http.server",
            &[
                ("http.method", method_label.as_str()),
                ("http.route", route),
            ],
            |span| async move {
                let observer = span.clone();
                let response = work(span, sent_inner).await?;

                let code = response.status();
                observer.set_attr("http.status_code", code.as_u16().to_string());
                if code.is_server_error() {
                    observer.set_status(SpanStatus::Error);
                }
                Ok(response)
            },
        )
        .await;

    match out {
        Ok(response) => response,
        Err(err) if sent.get() => {
            tracing::error!(error = %err, route, "handler failed after response was sent");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
