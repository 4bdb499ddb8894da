//! Data models for scraped articles, sources and response envelopes.
//!
//! This module defines the structures that leave the pipeline:
//! - [`Article`]: one article teaser recovered from a source's front page
//! - [`Source`]: display metadata and entry URL of a configured news site
//! - [`NewsResponse`], [`SourcesResponse`], [`ErrorResponse`]: the JSON
//!   envelopes handed to callers
//!
//! Field names use snake_case on the wire (`image_url`, `published_at`,
//! `display_name`). A missing `description` or `image_url` is serialized as
//! `null`, never as an empty string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single article recovered from a listing page.
///
/// `url` is the deduplication key within one source's listing. `id` is the
/// source's id prefix plus a sequence counter; configuration keeps prefixes
/// distinct, so ids are unique within a crawl run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    pub id: String,
    /// Whitespace-normalized headline.
    pub title: String,
    /// Short summary, capped by the source profile.
    pub description: Option<String>,
    /// Absolute URL of the lead image.
    pub image_url: Option<String>,
    /// Absolute URL of the article page.
    pub url: String,
    /// Name of the source that produced the article.
    pub source: String,
    /// Time of extraction; listing pages do not expose publish times.
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Whether the enrichment pass has anything left to recover.
    pub fn needs_enrichment(&self) -> bool {
        is_blank(&self.image_url) || is_blank(&self.description)
    }
}

pub(crate) fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// A configured news source as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Stable key, e.g. `thedailystar`.
    pub name: String,
    pub display_name: String,
    /// Front page that the listing scraper starts from.
    pub url: String,
    pub active: bool,
}

/// Envelope for article listings.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewsResponse {
    pub success: bool,
    pub data: Vec<Article>,
    pub count: usize,
    /// Present when the listing is scoped to one source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl NewsResponse {
    pub fn new(data: Vec<Article>, source: Option<String>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
            source,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SourcesResponse {
    pub success: bool,
    pub sources: Vec<Source>,
}

/// Envelope for failed requests. `error` is machine-readable, `message` is
/// meant for humans.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            id: "dailystar_0".to_string(),
            title: "Flood waters recede across the north".to_string(),
            description: Some("Residents return home".to_string()),
            image_url: Some("https://example.com/a.jpg".to_string()),
            url: "https://example.com/news/bangladesh/2024/flood".to_string(),
            source: "thedailystar".to_string(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn test_article_wire_names() {
        let json = serde_json::to_value(article()).unwrap();
        assert_eq!(json["image_url"], "https://example.com/a.jpg");
        assert!(json.get("published_at").is_some());
        assert!(json.get("imageURL").is_none());
    }

    #[test]
    fn test_missing_fields_serialize_as_null() {
        let mut a = article();
        a.description = None;
        a.image_url = None;
        let json = serde_json::to_value(a).unwrap();
        assert!(json["description"].is_null());
        assert!(json["image_url"].is_null());
    }

    #[test]
    fn test_needs_enrichment() {
        let mut a = article();
        assert!(!a.needs_enrichment());

        a.description = None;
        assert!(a.needs_enrichment());

        a.description = Some("Residents return home".to_string());
        a.image_url = Some("   ".to_string());
        assert!(a.needs_enrichment());
    }

    #[test]
    fn test_news_response_counts_and_scope() {
        let resp = NewsResponse::new(vec![article(), article()], None);
        assert!(resp.success);
        assert_eq!(resp.count, 2);

        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("source").is_none());

        let scoped = NewsResponse::new(vec![], Some("cnn".to_string()));
        let value = serde_json::to_value(&scoped).unwrap();
        assert_eq!(value["source"], "cnn");
        assert_eq!(value["count"], 0);
    }

    #[test]
    fn test_source_deserialization() {
        let json = r#"{
            "name": "cnn",
            "display_name": "CNN",
            "url": "https://edition.cnn.com/",
            "active": true
        }"#;
        let source: Source = serde_json::from_str(json).unwrap();
        assert_eq!(source.display_name, "CNN");
        assert!(source.active);
    }
}
