//! Error taxonomy for the scraping pipeline.
//!
//! Errors are layered the same way work is layered:
//!
//! - [`FetchError`]: one HTTP request went wrong.
//! - [`ParseError`]: a document or a configured selector could not be used.
//! - [`ScrapeError`]: a whole source failed (its entry page could not be
//!   fetched or parsed).
//! - [`ServiceError`]: what a caller of the query API sees.
//! - [`ConfigError`]: the configuration could not be loaded.
//!
//! A container that yields no usable article is not an error at all; the
//! extractor simply returns `None` for it.

use crate::models::ErrorResponse;
use thiserror::Error;

/// Failure of a single document fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("unexpected status {status} fetching {url}")]
    StatusNotOk { url: String, status: u16 },
}

impl FetchError {
    /// Classify a `reqwest` failure for `url`.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed document from {url}")]
    MalformedDocument { url: String },

    #[error("invalid CSS selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// A source-level failure: nothing could be extracted from the entry page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch entry page of {source_name}: {error}")]
    Fetch {
        source_name: String,
        #[source]
        error: FetchError,
    },

    #[error("failed to parse entry page of {source_name}: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: ParseError,
    },
}

/// Errors surfaced by the query API.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("news source `{0}` not found")]
    SourceNotFound(String),

    #[error("news source `{0}` is currently inactive")]
    SourceInactive(String),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl ServiceError {
    /// Machine-readable error kind used in the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::SourceNotFound(_) => "source_not_found",
            ServiceError::SourceInactive(_) => "source_inactive",
            ServiceError::Scrape(_) => "fetch_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ServiceError::SourceNotFound(_) => "News source not found".to_string(),
            ServiceError::SourceInactive(_) => "News source is currently inactive".to_string(),
            ServiceError::Scrape(e) => format!("Failed to fetch news: {e}"),
        };
        ErrorResponse {
            success: false,
            error: self.kind().to_string(),
            message,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid source `{name}`: {reason}")]
    InvalidSource { name: String, reason: String },
}
