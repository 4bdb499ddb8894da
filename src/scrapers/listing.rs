//! Listing crawl of one source's front page.
//!
//! A crawl moves through `Idle → Crawling → Completed`, or ends in `Failed`
//! when the entry page cannot be fetched or parsed. Containers that do not
//! yield an article are skipped; only the entry page can fail a crawl.

use super::ScrapeOptions;
use super::enrich::enrich_articles;
use super::extract::{ArticleDraft, extract_listing, parse_document};
use super::profile::{RateLimit, SelectorProfile};
use crate::error::{ParseError, ScrapeError};
use crate::fetch::DocumentFetcher;
use crate::models::Article;
use crate::registry::RegisteredSource;
use chrono::Utc;
use rand::Rng;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Crawling,
    Completed,
    Failed,
}

/// Spaces out requests to one site during a crawl.
///
/// The first request goes out immediately; each later one waits the
/// configured delay plus a random jitter.
#[derive(Debug)]
pub struct CrawlLimiter {
    rate: RateLimit,
    requests: u32,
}

impl CrawlLimiter {
    pub fn new(rate: RateLimit) -> Self {
        Self { rate, requests: 0 }
    }

    pub async fn before_request(&mut self) {
        if self.requests > 0 {
            let jitter_ms = rand::rng().random_range(0..=self.rate.jitter_ms);
            let delay = self.rate.delay() + Duration::from_millis(jitter_ms);
            debug!(?delay, "Rate limiting crawl");
            sleep(delay).await;
        }
        self.requests += 1;
    }
}

/// Crawls one source: listing extraction followed by enrichment.
pub struct ListingScraper<'a, F> {
    fetcher: &'a F,
    source: &'a RegisteredSource,
    options: ScrapeOptions,
    limiter: CrawlLimiter,
    state: CrawlState,
    started: Option<Instant>,
}

impl<'a, F: DocumentFetcher> ListingScraper<'a, F> {
    pub fn new(fetcher: &'a F, source: &'a RegisteredSource, options: ScrapeOptions) -> Self {
        Self {
            fetcher,
            source,
            options,
            limiter: CrawlLimiter::new(source.profile.rate_limit),
            state: CrawlState::Idle,
            started: None,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    fn transition(&mut self, next: CrawlState) {
        debug!(source = %self.source.name(), from = ?self.state, to = ?next, "Crawl state change");
        self.state = next;
    }

    /// Run the crawl to completion. Articles come back in extraction order.
    pub async fn run(&mut self) -> Result<Vec<Article>, ScrapeError> {
        let mut articles = self.list().await?;
        self.enrich(&mut articles).await;
        Ok(articles)
    }

    /// Listing phase: fetch the entry page and extract its articles. The
    /// crawl stays in `Crawling` until [`ListingScraper::enrich`] finishes.
    #[instrument(level = "info", skip_all, fields(source = %self.source.name()))]
    pub async fn list(&mut self) -> Result<Vec<Article>, ScrapeError> {
        self.started = Some(Instant::now());
        self.transition(CrawlState::Crawling);

        let source = self.source;
        self.limiter.before_request().await;
        let body = match self
            .fetcher
            .fetch(source.entry.as_str(), self.options.listing_timeout)
            .await
        {
            Ok(body) => body,
            Err(error) => {
                self.transition(CrawlState::Failed);
                warn!(%error, "Entry page fetch failed");
                return Err(ScrapeError::Fetch {
                    source_name: source.name().to_string(),
                    error,
                });
            }
        };

        match collect_articles(source, &body) {
            Ok(articles) => {
                info!(count = articles.len(), "Extracted listing articles");
                Ok(articles)
            }
            Err(error) => {
                self.transition(CrawlState::Failed);
                warn!(%error, "Entry page could not be parsed");
                Err(ScrapeError::Parse {
                    source_name: source.name().to_string(),
                    error,
                })
            }
        }
    }

    /// Enrichment phase. Patches are merged into `articles` as they arrive,
    /// so dropping this future part way keeps the ones already applied.
    #[instrument(level = "info", skip_all, fields(source = %self.source.name()))]
    pub async fn enrich(&mut self, articles: &mut [Article]) {
        enrich_articles(self.fetcher, articles, &self.source.profile, &self.options).await;

        self.transition(CrawlState::Completed);
        info!(
            count = articles.len(),
            elapsed_ms = self.started.map_or(0, |t0| t0.elapsed().as_millis() as u64),
            "Listing crawl completed"
        );
    }
}

/// Convenience wrapper: crawl `source` once with a fresh scraper.
pub async fn scrape_source<F: DocumentFetcher>(
    fetcher: &F,
    source: &RegisteredSource,
    options: ScrapeOptions,
) -> Result<Vec<Article>, ScrapeError> {
    ListingScraper::new(fetcher, source, options).run().await
}

/// Walk every container of the entry page and keep the valid, unique
/// articles up to the profile's cap.
///
/// The parsed document never outlives this call.
fn collect_articles(source: &RegisteredSource, body: &[u8]) -> Result<Vec<Article>, ParseError> {
    let document = parse_document(source.entry.as_str(), body)?;
    let profile = &source.profile;
    let mut acceptor = Acceptor::new(source.name(), profile);

    for container in document.select(profile.containers.selector()) {
        if acceptor.is_full() {
            break;
        }
        if let Some(draft) = extract_listing(container, &source.entry, profile) {
            acceptor.offer(draft);
        }
    }
    Ok(acceptor.into_articles())
}

/// Applies dedup and the item cap to extracted drafts.
struct Acceptor<'a> {
    source: &'a str,
    profile: &'a SelectorProfile,
    seen_urls: HashSet<String>,
    seen_titles: HashSet<String>,
    articles: Vec<Article>,
}

impl<'a> Acceptor<'a> {
    fn new(source: &'a str, profile: &'a SelectorProfile) -> Self {
        Self {
            source,
            profile,
            seen_urls: HashSet::new(),
            seen_titles: HashSet::new(),
            articles: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.articles.len() >= self.profile.max_items
    }

    fn offer(&mut self, draft: ArticleDraft) {
        if self.is_full() || self.seen_urls.contains(&draft.url) {
            return;
        }
        if self.profile.dedup_by_title && self.seen_titles.contains(&draft.title) {
            return;
        }
        self.seen_urls.insert(draft.url.clone());
        self.seen_titles.insert(draft.title.clone());

        self.articles.push(Article {
            id: format!("{}_{}", self.profile.id_prefix, self.articles.len()),
            title: draft.title,
            description: draft.description,
            image_url: draft.image_url,
            url: draft.url,
            source: self.source.to_string(),
            published_at: Utc::now(),
        });
    }

    fn into_articles(self) -> Vec<Article> {
        self.articles
    }
}
