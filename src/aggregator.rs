//! Concurrent fan-out over every active source.
//!
//! One task is spawned per source and the aggregator waits for all of them
//! before merging. The merge follows registry order, and each source keeps
//! its own article order. A source that fails, panics or overruns the
//! deadline contributes nothing; the rest of the results still come back.
//!
//! # Deadline
//!
//! Without a deadline the aggregation lasts as long as the slowest source.
//! With one, each source task is bounded by it: when it elapses the task's
//! pending work is dropped, which abandons any fetch still in flight. A source
//! still listing at that point is treated like a failed one; a source that
//! has listed but is still enriching keeps its articles, with whatever
//! enrichment already landed.

use crate::fetch::DocumentFetcher;
use crate::models::Article;
use crate::registry::RegisteredSource;
use crate::scrapers::ScrapeOptions;
use crate::scrapers::listing::ListingScraper;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout_at;
use tracing::{error, info, instrument, warn};

/// Scrape every source in `sources` concurrently and merge the results.
#[instrument(level = "info", skip_all, fields(sources = sources.len(), ?deadline))]
pub async fn aggregate_all<F>(
    fetcher: Arc<F>,
    sources: Vec<Arc<RegisteredSource>>,
    options: ScrapeOptions,
    deadline: Option<Duration>,
) -> Vec<Article>
where
    F: DocumentFetcher + 'static,
{
    let t0 = Instant::now();
    let active: Vec<Arc<RegisteredSource>> =
        sources.into_iter().filter(|s| s.source.active).collect();
    let names: Vec<String> = active.iter().map(|s| s.name().to_string()).collect();

    let handles = active
        .into_iter()
        .map(|source| {
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move { scrape_bounded(&*fetcher, &source, options, deadline).await })
        })
        .collect::<Vec<_>>();

    let mut merged = Vec::new();
    for (name, joined) in names.iter().zip(join_all(handles).await) {
        match joined {
            Ok(articles) => merged.extend(articles),
            Err(e) => error!(source = %name, error = %e, "Source task panicked"),
        }
    }

    info!(
        count = merged.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Aggregation complete"
    );
    merged
}

async fn scrape_bounded<F: DocumentFetcher>(
    fetcher: &F,
    source: &RegisteredSource,
    options: ScrapeOptions,
    deadline: Option<Duration>,
) -> Vec<Article> {
    let mut scraper = ListingScraper::new(fetcher, source, options);
    let Some(limit) = deadline else {
        return match scraper.run().await {
            Ok(articles) => articles,
            Err(e) => {
                error!(source = %source.name(), state = ?scraper.state(), error = %e, "Source scrape failed");
                Vec::new()
            }
        };
    };

    let due = tokio::time::Instant::now() + limit;
    let listed = timeout_at(due, scraper.list()).await;
    let mut articles = match listed {
        Ok(Ok(articles)) => articles,
        Ok(Err(e)) => {
            error!(source = %source.name(), state = ?scraper.state(), error = %e, "Source scrape failed");
            return Vec::new();
        }
        Err(_) => {
            warn!(
                source = %source.name(),
                ?limit,
                state = ?scraper.state(),
                "Source overran the deadline before listing finished; dropping it"
            );
            return Vec::new();
        }
    };

    let enriched = timeout_at(due, scraper.enrich(&mut articles)).await;
    if enriched.is_err() {
        warn!(
            source = %source.name(),
            ?limit,
            count = articles.len(),
            "Deadline reached during enrichment; keeping listing results"
        );
    }
    articles
}
