//! docdash: terminal frontend for the document intelligence backend.
//! Uploads documents, asks questions against the session corpus, and shows
//! health/usage stats.
//!
//! Usage:
//!   docdash [--config <path>] upload <file>...
//!   docdash [--config <path>] ask [--doc <file>]... [question]...
//!   docdash [--config <path>] health [--watch [count]]
//!   docdash [--config <path>] metrics
//!   docdash [--config <path>] sessions

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use docdash_client::display::{
    format_file_size, format_uptime, ConfidenceLevel,
};
use docdash_client::models::QueryParams;
use docdash_client::upload::{validate_file, UploadStatus, UploadTracker};
use docdash_client::{config, fallback, ApiClient, Config};

fn resolve_config_path(args: &mut Vec<String>) -> Option<PathBuf> {
    // 1. --config <path> flag
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 < args.len() {
            let path = args.remove(pos + 1);
            args.remove(pos);
            return Some(PathBuf::from(path));
        }
    }
    // 2. DOCDASH_CONFIG env var
    if let Ok(val) = std::env::var("DOCDASH_CONFIG") {
        return Some(PathBuf::from(val));
    }
    // 3. Default path (~/.docdash/config.yaml)
    config::default_config_path()
}

fn load_config(path: Option<&PathBuf>) -> Config {
    // A missing config file is fine; the client falls back to defaults.
    match path {
        Some(p) if p.exists() => config::load(p).unwrap_or_else(|e| {
            eprintln!("Warning: ignoring config {}: {}", p.display(), e);
            Config::default()
        }),
        _ => Config::default(),
    }
}

fn usage() -> ! {
    eprintln!(
        "Usage: docdash [--config <path>] <upload|ask|health|metrics|sessions> [args]"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = resolve_config_path(&mut args);
    let cfg = load_config(config_path.as_ref());

    if args.is_empty() {
        usage();
    }
    let command = args.remove(0);

    let client = ApiClient::from_config(&cfg).context("failed to build API client")?;

    match command.as_str() {
        "upload" => cmd_upload(&client, &args).await,
        "ask" => cmd_ask(&client, &cfg, args).await,
        "health" => cmd_health(&client, &cfg, &args).await,
        "metrics" => {
            let metrics = client.get_metrics().await.context("failed to fetch metrics")?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
            Ok(())
        }
        "sessions" => {
            let sessions = client
                .get_sessions()
                .await
                .context("failed to fetch sessions")?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
            Ok(())
        }
        _ => usage(),
    }
}

/// Upload files sequentially, printing a per-file status badge.
async fn cmd_upload(client: &ApiClient, files: &[String]) -> Result<()> {
    if files.is_empty() {
        bail!("no files given; usage: docdash upload <file>...");
    }
    // Gate every file before any network request is made.
    for file in files {
        validate_file(file, None)?;
    }

    let mut tracker = UploadTracker::new();
    for file in files {
        let path = PathBuf::from(file);
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let id = tracker.start(file.clone(), size);

        match client.upload_document(&path).await {
            Ok(response) => {
                tracker.complete(id, &response);
                println!(
                    "✓ {} ({}) -> {} [{}]",
                    file,
                    format_file_size(size),
                    response.file_path,
                    UploadStatus::Completed.as_str()
                );
            }
            Err(e) => {
                tracker.fail(id);
                eprintln!("✗ {} [{}]: {}", file, UploadStatus::Error.as_str(), e);
            }
        }
    }

    println!(
        "{} of {} files uploaded ({}% success)",
        tracker.completed_count(),
        tracker.entries().len(),
        tracker.success_rate()
    );
    if tracker.completed_count() != tracker.entries().len() {
        bail!("some uploads failed");
    }
    Ok(())
}

/// Upload any `--doc` files, then ask each question in turn. One question's
/// full round trip completes before the next begins.
async fn cmd_ask(client: &ApiClient, cfg: &Config, mut args: Vec<String>) -> Result<()> {
    let mut docs = Vec::new();
    while let Some(pos) = args.iter().position(|a| a == "--doc") {
        if pos + 1 >= args.len() {
            bail!("--doc requires a file path");
        }
        docs.push(args.remove(pos + 1));
        args.remove(pos);
    }

    for doc in &docs {
        validate_file(doc, None)?;
    }
    for doc in &docs {
        let response = client
            .upload_document(&PathBuf::from(doc))
            .await
            .with_context(|| format!("failed to upload {}", doc))?;
        println!("✓ uploaded {} -> {}", doc, response.file_path);
    }

    // Questions from args, or one per stdin line.
    let questions: Vec<String> = if args.is_empty() {
        let stdin = io::stdin();
        stdin
            .lock()
            .lines()
            .map_while(|l| l.ok())
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    } else {
        args
    };
    if questions.is_empty() {
        bail!("no question provided (pass as arguments or on stdin)");
    }

    for question in &questions {
        let mut params = QueryParams::new(question.clone());
        params.domain = cfg.query.domain.clone();
        params.chunk_size = cfg.query.chunk_size;
        params.overlap = cfg.query.chunk_overlap;
        params.include_metadata = cfg.query.include_metadata.unwrap_or(true);
        params.semantic_search = cfg.query.semantic_search.unwrap_or(true);

        let outcome = client
            .submit_query(&params)
            .await
            .with_context(|| format!("query failed: {}", question))?;
        let result = fallback::resolve(outcome, &params);

        println!("Q: {}", question);
        println!("{}", result.answer);
        println!(
            "confidence: {:.2} ({})",
            result.confidence,
            ConfidenceLevel::from_score(result.confidence).as_str()
        );
        if !result.sources.is_empty() {
            println!("sources: {}", result.sources.join(", "));
        }
        println!();
    }
    Ok(())
}

/// Print a SystemHealth snapshot. With `--watch [count]`, keep polling at
/// the configured dashboard interval; each fetch replaces the last.
async fn cmd_health(client: &ApiClient, cfg: &Config, args: &[String]) -> Result<()> {
    let watch = args.first().map(|a| a == "--watch").unwrap_or(false);
    let count: Option<u64> = if watch {
        args.get(1).and_then(|s| s.parse().ok())
    } else {
        None
    };
    let interval = Duration::from_secs(cfg.dashboard.health_interval_secs.unwrap_or(30));

    let mut shown = 0u64;
    loop {
        let health = client
            .get_system_health()
            .await
            .context("failed to fetch system health")?;
        println!("status:            {}", health.status);
        println!("uptime:            {}", format_uptime(health.uptime));
        println!("active sessions:   {}", health.active_sessions);
        println!("total requests:    {}", health.total_requests);
        println!("avg response time: {:.2}s", health.average_response_time);
        println!(
            "memory: rss {:.1} MB, cpu {:.1}%",
            health.memory_usage.rss, health.memory_usage.cpu_percent
        );

        shown += 1;
        if !watch || count.is_some_and(|c| shown >= c) {
            break;
        }
        tokio::time::sleep(interval).await;
        println!();
    }
    Ok(())
}
