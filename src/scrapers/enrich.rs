//! Second-pass enrichment of listing articles.
//!
//! Listing teasers often lack an image or a summary. For each such article
//! the enrichment pass fetches the article's own page and fills in whatever
//! is still missing. Fetches are strictly sequential with a fixed pause after
//! each one, whatever its outcome, so a site never sees more than one
//! enrichment request at a time from a crawl.
//!
//! Enrichment is best-effort: a failed fetch or an unusable page is logged
//! and the article is left as it was.

use super::ScrapeOptions;
use super::extract::{DetailPatch, extract_details, parse_document};
use super::profile::SelectorProfile;
use crate::error::ParseError;
use crate::fetch::DocumentFetcher;
use crate::models::{Article, is_blank};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Fill missing images and descriptions from each article's own page.
///
/// Returns the number of articles that gained at least one field. Fields the
/// listing pass already populated are never overwritten, so running the pass
/// again over its own output changes nothing.
#[instrument(level = "info", skip_all, fields(articles = articles.len()))]
pub async fn enrich_articles<F: DocumentFetcher>(
    fetcher: &F,
    articles: &mut [Article],
    profile: &SelectorProfile,
    options: &ScrapeOptions,
) -> usize {
    let mut attempted = 0usize;
    let mut enriched = 0usize;

    for article in articles.iter_mut().filter(|a| a.needs_enrichment()) {
        attempted += 1;
        match fetcher.fetch(&article.url, options.detail_timeout).await {
            Ok(body) => match details_from_body(&article.url, &body, profile) {
                Ok(patch) => {
                    if merge_patch(article, patch) {
                        enriched += 1;
                        debug!(url = %article.url, "Enriched article");
                    }
                }
                Err(e) => warn!(url = %article.url, error = %e, "Unusable article page; skipping"),
            },
            Err(e) => warn!(url = %article.url, error = %e, "Article fetch failed; skipping"),
        }
        sleep(options.enrichment_delay).await;
    }

    if attempted > 0 {
        info!(attempted, enriched, "Enrichment pass finished");
    }
    enriched
}

fn details_from_body(
    url: &str,
    body: &[u8],
    profile: &SelectorProfile,
) -> Result<DetailPatch, ParseError> {
    let page = Url::parse(url).map_err(|_| ParseError::MalformedDocument {
        url: url.to_string(),
    })?;
    let document = parse_document(url, body)?;
    Ok(extract_details(
        &document,
        &page,
        &profile.enrichment,
        profile.description_max_chars,
    ))
}

/// Copy patch fields into empty article fields only. Returns whether
/// anything changed.
pub fn merge_patch(article: &mut Article, patch: DetailPatch) -> bool {
    let mut changed = false;
    if is_blank(&article.image_url) {
        if let Some(image) = patch.image_url.filter(|s| !s.is_empty()) {
            article.image_url = Some(image);
            changed = true;
        }
    }
    if is_blank(&article.description) {
        if let Some(description) = patch.description.filter(|s| !s.is_empty()) {
            article.description = Some(description);
            changed = true;
        }
    }
    changed
}
