//! Query API over the scraping pipeline.
//!
//! [`NewsService`] is what an outer surface (the CLI here) calls:
//! - [`NewsService::list_all`]: every active source, aggregated
//! - [`NewsService::list_by_source`]: one source, with not-found and
//!   inactive sources reported as errors
//! - [`NewsService::list_sources`]: configured sources

use crate::aggregator::aggregate_all;
use crate::error::ServiceError;
use crate::fetch::DocumentFetcher;
use crate::models::{NewsResponse, SourcesResponse};
use crate::registry::SourceRegistry;
use crate::scrapers::ScrapeOptions;
use crate::scrapers::listing::scrape_source;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub struct NewsService<F> {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<F>,
    options: ScrapeOptions,
    deadline: Option<Duration>,
}

impl<F: DocumentFetcher + 'static> NewsService<F> {
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<F>,
        options: ScrapeOptions,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            options,
            deadline,
        }
    }

    /// Articles from every active source. Failing sources are left out; this
    /// never fails as a whole.
    #[instrument(level = "info", skip_all)]
    pub async fn list_all(&self) -> NewsResponse {
        let articles = aggregate_all(
            Arc::clone(&self.fetcher),
            self.registry.active(),
            self.options,
            self.deadline,
        )
        .await;
        NewsResponse::new(articles, None)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn list_by_source(&self, name: &str) -> Result<NewsResponse, ServiceError> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| ServiceError::SourceNotFound(name.to_string()))?;
        if !entry.source.active {
            return Err(ServiceError::SourceInactive(name.to_string()));
        }

        let articles = scrape_source(&*self.fetcher, entry, self.options).await?;
        Ok(NewsResponse::new(articles, Some(name.to_string())))
    }

    pub fn list_sources(&self) -> SourcesResponse {
        SourcesResponse {
            success: true,
            sources: self.registry.sources(),
        }
    }
}
