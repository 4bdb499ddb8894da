//! Per-source selector profiles.
//!
//! A [`SelectorProfile`] is plain configuration: which blocks of a listing
//! page count as article containers, and the ordered selector chains used to
//! recover each field from them. Profiles are deserialized from YAML and
//! their selectors are compiled at load time, so a typo in a selector fails
//! the configuration rather than every request.

use crate::error::ParseError;
use scraper::{ElementRef, Selector};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// A compiled CSS selector that remembers its source text.
#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Css {
    raw: String,
    selector: Selector,
}

impl Css {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let selector = Selector::parse(raw).map_err(|e| ParseError::InvalidSelector {
            selector: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            selector,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl TryFrom<String> for Css {
    type Error = ParseError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Css::parse(&raw)
    }
}

impl fmt::Debug for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Css").field(&self.raw).finish()
    }
}

/// One step of a "first non-empty wins" fallback chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Normalized text of the first matching element at least `min_chars`
    /// long.
    Text {
        selector: Css,
        #[serde(default)]
        min_chars: usize,
    },
    /// First non-empty value of `attr` on a matching element.
    Attr { selector: Css, attr: String },
    /// `attrs` tried in order on the first matching element only. Later
    /// matches are never consulted, even when the first one carries none of
    /// the attributes.
    FirstAttr { selector: Css, attrs: Vec<String> },
}

impl Strategy {
    pub fn text(selector: &str, min_chars: usize) -> Result<Self, ParseError> {
        Ok(Strategy::Text {
            selector: Css::parse(selector)?,
            min_chars,
        })
    }

    pub fn attr(selector: &str, attr: &str) -> Result<Self, ParseError> {
        Ok(Strategy::Attr {
            selector: Css::parse(selector)?,
            attr: attr.to_string(),
        })
    }

    pub fn first_attr(selector: &str, attrs: &[&str]) -> Result<Self, ParseError> {
        Ok(Strategy::FirstAttr {
            selector: Css::parse(selector)?,
            attrs: attrs.iter().map(|a| a.to_string()).collect(),
        })
    }

    /// Evaluate this strategy against the descendants of `scope`.
    pub fn apply(&self, scope: ElementRef<'_>) -> Option<String> {
        match self {
            Strategy::Text {
                selector,
                min_chars,
            } => scope.select(selector.selector()).find_map(|el| {
                let text = crate::utils::normalize_whitespace(&el.text().collect::<String>());
                (!text.is_empty() && text.chars().count() >= *min_chars).then_some(text)
            }),
            Strategy::Attr { selector, attr } => {
                scope.select(selector.selector()).find_map(|el| {
                    el.value()
                        .attr(attr)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                })
            }
            Strategy::FirstAttr { selector, attrs } => {
                let el = scope.select(selector.selector()).next()?;
                attrs.iter().find_map(|attr| {
                    el.value()
                        .attr(attr)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                })
            }
        }
    }
}

/// Run `strategies` in order and return the first value any of them yields.
/// Later strategies are never evaluated once one succeeds.
pub fn first_match(strategies: &[Strategy], scope: ElementRef<'_>) -> Option<String> {
    strategies.iter().find_map(|s| s.apply(scope))
}

/// What happens to a title after whitespace normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePolicy {
    /// Keep only the text before the first `,` or `.`.
    #[default]
    FirstTerminator,
    Keep,
}

/// Where a container's article link comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkRule {
    /// `href` of the first descendant matching `selector`.
    Descendant { selector: Css },
    /// The container is itself the anchor.
    OwnHref,
    /// The anchor that yielded the title: the title element itself or its
    /// first descendant `a`, falling back to the container's first `a`.
    Title,
}

/// Separates leaf article pages from section and index pages.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkFilter {
    /// Paths with this many `/`-separated segments or fewer are index pages.
    #[serde(default = "default_index_path_segments")]
    pub index_path_segments: usize,
    /// Path fragments such as `/news/`; at least one must appear.
    pub keywords: Vec<String>,
}

impl LinkFilter {
    /// Whether `path` (the path component of an absolute URL) looks like a
    /// leaf article page.
    pub fn accepts(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() <= self.index_path_segments {
            return false;
        }
        if segments.last().is_some_and(|s| s.is_empty()) {
            return false;
        }
        self.keywords.iter().any(|k| path.contains(k.as_str()))
    }
}

/// Courtesy delay between successive requests to one site during a crawl.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimit {
    pub delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            jitter_ms: 1000,
        }
    }
}

impl RateLimit {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Fallback chains used against an article's own page.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentProfile {
    pub image: Vec<Strategy>,
    pub description: Vec<Strategy>,
}

impl EnrichmentProfile {
    /// Paragraphs shorter than this are not used as a description.
    pub const PARAGRAPH_MIN_CHARS: usize = 50;

    fn builtin() -> Result<Self, ParseError> {
        Ok(Self {
            image: vec![
                Strategy::attr("picture img", "data-srcset")?,
                Strategy::attr("span.lg-gallery", "data-src")?,
                Strategy::attr("meta[property='og:image']", "content")?,
                Strategy::attr("article img, div.section-media img", "src")?,
            ],
            description: vec![
                Strategy::attr("meta[property='og:description']", "content")?,
                Strategy::attr("meta[name='description']", "content")?,
                Strategy::text(
                    ".article__content p, .article-body p, .paragraph, .zn-body__paragraph",
                    Self::PARAGRAPH_MIN_CHARS + 1,
                )?,
            ],
        })
    }
}

impl Default for EnrichmentProfile {
    fn default() -> Self {
        // The built-in selectors are literals; failing to parse them is a bug.
        Self::builtin().expect("built-in enrichment selectors are valid")
    }
}

/// Site-specific extraction rules for one source.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorProfile {
    /// Prefix of generated article ids, e.g. `dailystar` → `dailystar_0`.
    pub id_prefix: String,
    /// Blocks of the listing page that each hold one article teaser.
    pub containers: Css,
    pub title: Vec<Css>,
    #[serde(default)]
    pub title_policy: TitlePolicy,
    pub link: LinkRule,
    #[serde(default)]
    pub link_filter: Option<LinkFilter>,
    #[serde(default)]
    pub image: Vec<Strategy>,
    #[serde(default)]
    pub description: Vec<Strategy>,
    /// Also treat repeated titles as duplicates.
    #[serde(default)]
    pub dedup_by_title: bool,
    pub max_items: usize,
    #[serde(default = "default_title_min_chars")]
    pub title_min_chars: usize,
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub enrichment: EnrichmentProfile,
}

fn default_index_path_segments() -> usize {
    3
}

fn default_title_min_chars() -> usize {
    10
}

fn default_description_max_chars() -> usize {
    200
}
