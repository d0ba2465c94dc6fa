mod client;
mod output;
mod scenarios;
mod telemetry;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracelab_core::config::Config;
use tracelab_core::model::span::SpanRecord;
use tracelab_server::AppState;

use crate::client::DemoClient;
use crate::telemetry::{init_cli_tracing, init_server_tracing};

#[derive(Parser, Debug)]
#[command(name = "tracelab")]
#[command(about = "Tracing demo workbench: scenario backend and demo driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the scenario backend")]
    Run {
        #[arg(long)]
        listen_addr: Option<String>,
        #[arg(long, help = "Slow endpoint delay (e.g. 2s, 150ms)")]
        slow_delay: Option<String>,
        #[arg(long)]
        batch_items: Option<usize>,
        #[arg(long)]
        posts: Option<usize>,
    },
    #[command(about = "Drive a demo scenario against a running backend")]
    Demo {
        #[command(subcommand)]
        scenario: DemoCommand,
    },
    #[command(about = "Fetch and print recently recorded backend spans")]
    Spans {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum DemoCommand {
    #[command(about = "Single slow request with a timer child span")]
    Slow,
    #[command(about = "Users query with db + format child spans")]
    Db,
    #[command(about = "Sequential batch items under one parent span")]
    Batch,
    #[command(about = "Hardcoded user profile fetch")]
    Attributes,
    #[command(about = "Scripted backend failure and exception capture")]
    Error,
    #[command(name = "n-plus-one", about = "Naive vs batched comments fetching")]
    NPlusOne {
        #[arg(long)]
        optimized: bool,
    },
    #[command(name = "fan-out", about = "Concurrent requests through the traced client")]
    FanOut {
        #[arg(long, default_value_t = 12)]
        requests: usize,
    },
    #[command(about = "Every scenario in sequence")]
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            listen_addr,
            slow_delay,
            batch_items,
            posts,
        } => {
            init_server_tracing();
            run_server(listen_addr, slow_delay, batch_items, posts).await
        }
        Commands::Demo { scenario } => {
            init_cli_tracing();
            let client = DemoClient::new(resolve_base_url(cli.base_url)?);
            run_demo(&client, scenario).await?;
            print_client_spans(&client, cli.json)
        }
        Commands::Spans { limit } => {
            init_cli_tracing();
            let base = resolve_base_url(cli.base_url)?;
            let spans = fetch_recorded_spans(&base, limit).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&spans)?);
            } else {
                output::print_spans_human(&spans);
            }
            Ok(())
        }
    }
}

async fn run_server(
    listen_addr: Option<String>,
    slow_delay: Option<String>,
    batch_items: Option<usize>,
    posts: Option<usize>,
) -> anyhow::Result<()> {
    let mut cfg = Config::load().context("load config")?;
    if let Some(v) = listen_addr {
        cfg.listen_addr = v;
    }
    if let Some(v) = slow_delay {
        cfg.slow_delay = humantime::parse_duration(&v).context("parse --slow-delay")?;
    }
    if let Some(v) = batch_items {
        cfg.batch_items = v;
    }
    if let Some(v) = posts {
        cfg.demo_post_count = v;
    }

    eprintln!("tracelab run");
    eprintln!("  listen: {}", cfg.listen_addr);
    eprintln!("  slow delay: {}", humantime::format_duration(cfg.slow_delay));
    eprintln!("  batch items: {}", cfg.batch_items);
    eprintln!("  tip: run `tracelab demo all` in another shell");

    let state = AppState::new(cfg);
    let server_task = tokio::spawn(tracelab_server::serve::run_server(state));

    tokio::select! {
        res = server_task => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }
    Ok(())
}

async fn run_demo(client: &DemoClient, scenario: DemoCommand) -> anyhow::Result<()> {
    match scenario {
        DemoCommand::Slow => scenarios::slow(client).await,
        DemoCommand::Db => scenarios::db(client).await,
        DemoCommand::Batch => scenarios::batch(client).await,
        DemoCommand::Attributes => scenarios::attributes(client).await,
        DemoCommand::Error => scenarios::error(client).await,
        DemoCommand::NPlusOne { optimized } => scenarios::n_plus_one(client, optimized).await,
        DemoCommand::FanOut { requests } => scenarios::fan_out(client, requests).await,
        DemoCommand::All => scenarios::all(client).await,
    }
}

fn print_client_spans(client: &DemoClient, json: bool) -> anyhow::Result<()> {
    let spans = client.recorder().spans();
    if json {
        println!("{}", serde_json::to_string_pretty(&spans)?);
        return Ok(());
    }
    println!();
    output::print_demo_header("client spans");
    output::print_spans_human(&spans);
    Ok(())
}

fn resolve_base_url(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(base) = flag {
        return Ok(base);
    }
    let cfg = Config::from_env().context("load config from env")?;
    Ok(cfg.base_url)
}

async fn fetch_recorded_spans(base: &str, limit: usize) -> anyhow::Result<Vec<SpanRecord>> {
    let url = format!("{}/api/spans?limit={limit}", base.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("fetch {url}"))?;
    anyhow::ensure!(
        response.status().is_success(),
        "span feed request failed with status {}",
        response.status()
    );
    Ok(response.json().await.context("decode span feed")?)
}
