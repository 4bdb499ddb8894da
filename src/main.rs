//! # Top News
//!
//! Scrapes the front pages of configured news sites into structured article
//! listings (title, link, image, short description) and prints them as JSON
//! envelopes.
//!
//! ## Usage
//!
//! ```sh
//! top_news news                      # every active source
//! top_news news --source cnn         # one source
//! top_news sources                   # configured sources
//! ```
//!
//! ## Architecture
//!
//! 1. **Registry**: sources and selector profiles are loaded from YAML
//! 2. **Listing**: each active source's front page is fetched and its article
//!    containers are extracted, one concurrent task per source
//! 3. **Enrichment**: articles missing an image or description are revisited
//!    one by one
//! 4. **Output**: the merged articles are printed (and optionally written) as
//!    a JSON envelope

use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod registry;
mod scrapers;
mod service;
mod utils;

use cli::{Cli, Command};
use config::Settings;
use fetch::HttpFetcher;
use models::HealthResponse;
use outputs::json;
use registry::SourceRegistry;
use scrapers::ScrapeOptions;
use service::NewsService;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("top_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let mut settings = Settings::load(args.config.as_deref()).await?;
    if args.deadline_secs.is_some() {
        settings.deadline_secs = args.deadline_secs;
    }

    let registry = Arc::new(SourceRegistry::from_settings(&settings)?);
    let fetcher = Arc::new(HttpFetcher::new(&settings.client_config())?);
    let service = NewsService::new(
        registry,
        fetcher,
        ScrapeOptions::from(&settings),
        settings.deadline(),
    );

    let result = match &args.command {
        Command::News { source: None } => {
            let resp = service.list_all().await;
            emit(&resp, "all", &args).await
        }
        Command::News {
            source: Some(name),
        } => match service.list_by_source(name).await {
            Ok(resp) => emit(&resp, name, &args).await,
            Err(e) => {
                error!(source = %name, kind = e.kind(), error = %e, "Request failed");
                emit(&e.to_response(), name, &args).await?;
                Err(e.into())
            }
        },
        Command::Sources => emit(&service.list_sources(), "sources", &args).await,
        Command::Health => {
            let health = HealthResponse {
                status: "healthy",
                timestamp: Utc::now(),
            };
            emit(&health, "health", &args).await
        }
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, millis = elapsed.as_millis() as u64, "Execution complete");
    result
}

/// Print `envelope` on stdout and, when requested, keep a snapshot on disk.
async fn emit<T: Serialize>(envelope: &T, name: &str, args: &Cli) -> Result<(), Box<dyn Error>> {
    let body = if args.pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    debug!(preview = %truncate_for_log(&body, 300), "Emitting envelope");
    println!("{body}");

    if let Some(dir) = &args.json_output_dir {
        json::write_snapshot(envelope, dir, name).await?;
    }
    Ok(())
}
