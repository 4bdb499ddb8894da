//! The extraction-and-enrichment pipeline.
//!
//! Every source goes through the same two phases:
//!
//! 1. **Listing**: fetch the front page, walk the article containers named by
//!    the source's [`profile::SelectorProfile`] and turn each into an article
//!    ([`listing`], using [`extract`])
//! 2. **Enrichment**: revisit articles that are missing an image or a
//!    description, one at a time, and fill the gaps ([`enrich`])
//!
//! Sites differ only in their profiles; there is no per-site code.

pub mod enrich;
pub mod extract;
pub mod listing;
pub mod profile;

use crate::config::Settings;
use std::time::Duration;

/// Timings shared by every listing crawl.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeOptions {
    pub listing_timeout: Duration,
    pub detail_timeout: Duration,
    /// Pause after each enrichment fetch.
    pub enrichment_delay: Duration,
}

impl From<&Settings> for ScrapeOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            listing_timeout: settings.listing_timeout(),
            detail_timeout: settings.detail_timeout(),
            enrichment_delay: settings.enrichment_delay(),
        }
    }
}
