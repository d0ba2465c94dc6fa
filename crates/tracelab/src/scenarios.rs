use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracelab_core::TracelabError;

use crate::client::DemoClient;
use crate::output;

pub async fn slow(client: &DemoClient) -> anyhow::Result<()> {
    output::print_demo_header("slow api demo");
    let started = Instant::now();

    let result = client
        .tracer()
        .in_span(None, "demo.slow", "demo", &[], |root| async move {
            client.traced_get(Some(&root.context()), "/api/slow").await
        })
        .await?;

    output::print_elapsed("elapsed", started.elapsed());
    match result.body.get("message").and_then(|m| m.as_str()) {
        Some(message) => output::print_ok(message),
        None => output::print_failure(&format!("unexpected payload: {}", result.body)),
    }
    Ok(())
}

pub async fn db(client: &DemoClient) -> anyhow::Result<()> {
    output::print_demo_header("db query demo");

    let result = client
        .tracer()
        .in_span(None, "demo.db", "demo", &[], |root| async move {
            client.traced_get(Some(&root.context()), "/api/db").await
        })
        .await?;

    anyhow::ensure!(
        result.status.is_success(),
        "db fetch returned {}",
        result.status
    );
    let count = result.body.as_array().map(Vec::len).unwrap_or(0);
    output::print_ok(&format!("fetched {count} users"));
    Ok(())
}

pub async fn attributes(client: &DemoClient) -> anyhow::Result<()> {
    output::print_demo_header("user attributes demo");

    let result = client
        .tracer()
        .in_span(None, "demo.attributes", "demo", &[], |root| async move {
            client
                .traced_get(Some(&root.context()), "/api/user-attributes")
                .await
        })
        .await?;

    let name = result.body["name"].as_str().unwrap_or("<missing>");
    let theme = result.body["preferences"]["theme"].as_str().unwrap_or("<missing>");
    output::print_ok(&format!("user={name} theme={theme}"));
    Ok(())
}

pub async fn batch(client: &DemoClient) -> anyhow::Result<()> {
    output::print_demo_header("batch processing demo");
    let started = Instant::now();

    let result = client
        .tracer()
        .in_span(None, "demo.batch", "demo", &[], |root| async move {
            client.traced_get(Some(&root.context()), "/api/batch").await
        })
        .await?;

    output::print_elapsed("elapsed", started.elapsed());
    for item in result.body.as_array().cloned().unwrap_or_default() {
        if let Some(line) = item.as_str() {
            output::print_ok(line);
        }
    }
    Ok(())
}

/// Concurrent fan-out against a fast endpoint. The wall clock should track
/// the slowest call, not the sum, since nothing in the traced wrapper
/// serializes siblings.
pub async fn fan_out(client: &DemoClient, requests: usize) -> anyhow::Result<()> {
    output::print_demo_header("fan-out demo");
    let requests_attr = requests.to_string();
    let started = Instant::now();

    let times: Vec<Duration> = client
        .tracer()
        .in_span(
            None,
            "demo.fan-out",
            "demo",
            &[("fanout.requests", requests_attr.as_str())],
            |root| async move {
                let parent = root.context();
                let calls = (0..requests).map(|_| {
                    let parent = parent.clone();
                    async move {
                        let call_started = Instant::now();
                        client
                            .traced_get(Some(&parent), "/api/user-attributes")
                            .await?;
                        Ok::<_, TracelabError>(call_started.elapsed())
                    }
                });
                futures::future::join_all(calls).await.into_iter().collect()
            },
        )
        .await?;

    let wall = started.elapsed();
    let sum: Duration = times.iter().sum();
    output::print_elapsed("wall clock", wall);
    output::print_elapsed("sum of calls", sum);
    output::print_ok(&format!("{requests} concurrent requests completed"));
    Ok(())
}

struct NPlusOneStats {
    posts: usize,
    comments: usize,
    requests: usize,
    posts_time: Duration,
}

pub async fn n_plus_one(client: &DemoClient, optimized: bool) -> anyhow::Result<()> {
    if optimized {
        output::print_demo_header("n+1 demo (optimized: one batched comments query)");
    } else {
        output::print_demo_header("n+1 demo (naive: one comments query per post)");
    }
    let name = if optimized {
        "demo.n-plus-one.optimized"
    } else {
        "demo.n-plus-one.naive"
    };
    let started = Instant::now();

    let stats = client
        .tracer()
        .in_span(None, name, "demo", &[], |root| async move {
            let parent = root.context();

            let posts_started = Instant::now();
            let posts = client.traced_get(Some(&parent), "/api/posts").await?;
            let posts_time = posts_started.elapsed();
            let posts: Vec<serde_json::Value> = posts
                .body
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .take(10)
                .collect();
            let post_ids: Vec<u64> = posts
                .iter()
                .filter_map(|p| p.get("id").and_then(|v| v.as_u64()))
                .collect();

            let mut requests = 1usize;
            let comments = if optimized {
                let all = client.traced_get(Some(&parent), "/api/comments").await?;
                requests += 1;

                let mut by_post: BTreeMap<u64, usize> = BTreeMap::new();
                for comment in all.body.as_array().cloned().unwrap_or_default() {
                    if let Some(pid) = comment.get("post_id").and_then(|v| v.as_u64()) {
                        *by_post.entry(pid).or_default() += 1;
                    }
                }
                post_ids
                    .iter()
                    .map(|id| by_post.get(id).copied().unwrap_or(0))
                    .sum()
            } else {
                let fetches = post_ids.iter().map(|id| {
                    let parent = parent.clone();
                    let path = format!("/api/posts/{id}/comments");
                    async move {
                        let result = client.traced_get(Some(&parent), &path).await?;
                        Ok::<_, TracelabError>(
                            result.body.as_array().map(Vec::len).unwrap_or(0),
                        )
                    }
                });
                let results = futures::future::join_all(fetches).await;
                requests += results.len();
                let mut total = 0;
                for fetched in results {
                    total += fetched?;
                }
                total
            };

            Ok::<_, TracelabError>(NPlusOneStats {
                posts: posts.len(),
                comments,
                requests,
                posts_time,
            })
        })
        .await?;

    output::print_elapsed("total", started.elapsed());
    output::print_elapsed("posts query", stats.posts_time);
    output::print_ok(&format!(
        "{} posts, {} comments, {} requests",
        stats.posts, stats.comments, stats.requests
    ));
    Ok(())
}

pub async fn error(client: &DemoClient) -> anyhow::Result<()> {
    output::print_demo_header("error capture demo");

    let result = client
        .tracer()
        .in_span(None, "demo.error", "demo", &[], |root| async move {
            client.traced_get(Some(&root.context()), "/debug-error").await
        })
        .await?;

    if result.status.as_u16() == 500 {
        let message = result.body["error"].as_str().unwrap_or("<no body>");
        output::print_ok(&format!("backend replied 500 as scripted: {message}"));
    } else {
        output::print_failure(&format!(
            "expected a 500 from /debug-error, got {}",
            result.status
        ));
    }
    Ok(())
}

pub async fn all(client: &DemoClient) -> anyhow::Result<()> {
    slow(client).await?;
    db(client).await?;
    attributes(client).await?;
    batch(client).await?;
    fan_out(client, 12).await?;
    n_plus_one(client, false).await?;
    n_plus_one(client, true).await?;
    error(client).await?;
    Ok(())
}
