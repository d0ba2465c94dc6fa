use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracelab_core::TracelabError;
use tracelab_core::model::span::SpanStatus;

use crate::handler::wrap_handler;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/slow", get(slow))
        .route("/api/db", get(db_users))
        .route("/api/batch", get(batch))
        .route("/api/user-attributes", get(user_attributes))
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{id}", get(get_post))
        .route("/api/posts/{id}/comments", get(post_comments))
        .route("/api/comments", get(list_comments))
        .route("/api/spans", get(list_spans))
        .route("/debug-error", get(debug_error))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

async fn slow(State(state): State<AppState>) -> Response {
    let st = state.clone();
    wrap_handler(state, Method::GET, "/api/slow", move |span, _sent| async move {
        let tracer = st.tracer.clone();
        let parent = span.context();
        let delay = st.cfg.slow_delay;

        tracer
            .in_span(Some(&parent), "waiting-period", "timer", &[], |_| async move {
                tokio::time::sleep(delay).await;
                Ok::<_, TracelabError>(())
            })
            .await?;

        let message = format!(
            "This response took {} to complete!",
            humantime::format_duration(delay)
        );
        Ok(Json(json!({ "message": message })).into_response())
    })
    .await
}

async fn db_users(State(state): State<AppState>) -> Response {
    let st = state.clone();
    wrap_handler(state, Method::GET, "/api/db", move |span, _sent| async move {
        let tracer = st.tracer.clone();
        let parent = span.context();
        let delay = st.cfg.db_query_delay;
        let data = st.data.clone();

        let users = tracer
            .in_span(
                Some(&parent),
                "fetch-users",
                "db.query",
                &[("db.table", "users")],
                |query_span| async move {
                    tokio::time::sleep(delay).await;
                    let users = data.users();
                    query_span.set_attr("db.rows", users.len().to_string());
                    Ok::<_, TracelabError>(users)
                },
            )
            .await?;

        let payload = tracer
            .in_span(Some(&parent), "format-response", "format", &[], |_| async move {
                serde_json::to_value(&users).map_err(|e| TracelabError::Internal(e.to_string()))
            })
            .await?;

        Ok(Json(payload).into_response())
    })
    .await
}

async fn batch(State(state): State<AppState>) -> Response {
    let st = state.clone();
    wrap_handler(state, Method::GET, "/api/batch", move |span, _sent| async move {
        let tracer = st.tracer.clone();
        let item_tracer = st.tracer.clone();
        let items = st.cfg.batch_items;
        let base = st.cfg.batch_item_base;
        let jitter_cap = st.cfg.batch_item_jitter.as_millis() as u64;
        let parent = span.context();

        let results = tracer
            .in_span(
                Some(&parent),
                "batch-process",
                "batch",
                &[],
                |batch_span| async move {
                    let mut results = Vec::with_capacity(items);
                    for i in 1..=items {
                        let item_parent = batch_span.context();
                        let name = format!("batch-item-{i}");
                        let item = item_tracer
                            .in_span(
                                Some(&item_parent),
                                &name,
                                "batch.item",
                                &[],
                                |item_span| async move {
                                    let jitter = if jitter_cap == 0 {
                                        0
                                    } else {
                                        fastrand::u64(0..jitter_cap)
                                    };
                                    let took = base + Duration::from_millis(jitter);
                                    tokio::time::sleep(took).await;
                                    item_span.set_attr(
                                        "batch.duration_ms",
                                        took.as_millis().to_string(),
                                    );
                                    Ok::<_, TracelabError>(format!(
                                        "Batch item {i} processed in {}ms",
                                        took.as_millis()
                                    ))
                                },
                            )
                            .await?;
                        results.push(item);
                    }
                    batch_span.set_status(SpanStatus::Ok);
                    Ok::<_, TracelabError>(results)
                },
            )
            .await?;

        Ok(Json(results).into_response())
    })
    .await
}

async fn user_attributes(State(state): State<AppState>) -> Response {
    wrap_handler(
        state,
        Method::GET,
        "/api/user-attributes",
        |_span, _sent| async {
            Ok(Json(json!({
                "id": 12345,
                "name": "Test User",
                "email": "test@example.com",
                "preferences": {
                    "theme": "dark",
                    "notifications": true,
                    "language": "en-US",
                },
            }))
            .into_response())
        },
    )
    .await
}

async fn list_posts(State(state): State<AppState>) -> Response {
    let st = state.clone();
    wrap_handler(state, Method::GET, "/api/posts", move |span, _sent| async move {
        let tracer = st.tracer.clone();
        let parent = span.context();
        let delay = st.cfg.db_query_delay;
        let data = st.data.clone();

        let posts = tracer
            .in_span(
                Some(&parent),
                "fetch-posts",
                "db.query",
                &[("db.table", "posts")],
                |query_span| async move {
                    tokio::time::sleep(delay).await;
                    let posts = data.posts();
                    query_span.set_attr("db.rows", posts.len().to_string());
                    Ok::<_, TracelabError>(posts)
                },
            )
            .await?;

        Ok(Json(posts).into_response())
    })
    .await
}

async fn get_post(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let st = state.clone();
    wrap_handler(
        state,
        Method::GET,
        "/api/posts/{id}",
        move |span, _sent| async move {
            let tracer = st.tracer.clone();
            let parent = span.context();
            let delay = st.cfg.db_query_delay;
            let data = st.data.clone();

            let post = tracer
                .in_span(
                    Some(&parent),
                    "fetch-post",
                    "db.query",
                    &[("db.table", "posts")],
                    |query_span| async move {
                        tokio::time::sleep(delay).await;
                        let post = data.post(id);
                        query_span.set_attr("db.rows", if post.is_some() { "1" } else { "0" });
                        Ok::<_, TracelabError>(post)
                    },
                )
                .await?;

            match post {
                Some(post) => Ok(Json(post).into_response()),
                None => Ok(not_found("post not found")),
            }
        },
    )
    .await
}

async fn post_comments(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let st = state.clone();
    wrap_handler(
        state,
        Method::GET,
        "/api/posts/{id}/comments",
        move |span, _sent| async move {
            let tracer = st.tracer.clone();
            let parent = span.context();
            let delay = st.cfg.db_query_delay;
            let data = st.data.clone();

            if data.post(id).is_none() {
                return Ok(not_found("post not found"));
            }

            let comments = tracer
                .in_span(
                    Some(&parent),
                    "fetch-comments",
                    "db.query",
                    &[("db.table", "comments")],
                    |query_span| async move {
                        tokio::time::sleep(delay).await;
                        let comments = data.comments_for(id);
                        query_span.set_attr("db.rows", comments.len().to_string());
                        Ok::<_, TracelabError>(comments)
                    },
                )
                .await?;

            Ok(Json(comments).into_response())
        },
    )
    .await
}

async fn list_comments(State(state): State<AppState>) -> Response {
    let st = state.clone();
    wrap_handler(
        state,
        Method::GET,
        "/api/comments",
        move |span, _sent| async move {
            let tracer = st.tracer.clone();
            let parent = span.context();
            let delay = st.cfg.db_query_delay;
            let data = st.data.clone();

            let comments = tracer
                .in_span(
                    Some(&parent),
                    "fetch-comments",
                    "db.query",
                    &[("db.table", "comments")],
                    |query_span| async move {
                        tokio::time::sleep(delay).await;
                        let comments = data.comments();
                        query_span.set_attr("db.rows", comments.len().to_string());
                        Ok::<_, TracelabError>(comments)
                    },
                )
                .await?;

            Ok(Json(comments).into_response())
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
struct SpansQuery {
    limit: Option<usize>,
}

// Deliberately untraced so reading the dashboard feed does not fill the
// recorder with its own spans.
async fn list_spans(State(state): State<AppState>, Query(q): Query<SpansQuery>) -> Response {
    let mut spans = state.recorder.spans();
    spans.reverse();
    spans.truncate(q.limit.unwrap_or(50));
    Json(spans).into_response()
}

async fn debug_error(State(state): State<AppState>) -> Response {
    wrap_handler(state, Method::GET, "/debug-error", |_span, _sent| async {
        Err::<Response, _>(TracelabError::Demo("intentional demo error".to_string()))
    })
    .await
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}
