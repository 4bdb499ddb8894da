//! Field extraction from parsed markup.
//!
//! Two modes share the same fallback machinery:
//!
//! - **Listing mode** ([`extract_listing`]): one article container on a
//!   front page becomes at most one [`ArticleDraft`]. A container without a
//!   usable title or link yields `None` and is silently skipped.
//! - **Enrichment mode** ([`extract_details`]): an article's own page yields
//!   a [`DetailPatch`] with whatever image and description it exposes.
//!
//! All URLs leaving this module are absolute.

use super::profile::{EnrichmentProfile, LinkRule, SelectorProfile, TitlePolicy, first_match};
use crate::error::ParseError;
use crate::utils::{cap_chars, cut_at_terminator, normalize_whitespace};
use scraper::{ElementRef, Html};
use tracing::trace;
use url::Url;

/// Fields recovered from one listing container.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// Fields recovered from an article's own page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPatch {
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// Parse a fetched body into a document.
///
/// Bodies are decoded as UTF-8, replacing invalid sequences. A body with no
/// markup at all is reported as malformed.
pub fn parse_document(url: &str, body: &[u8]) -> Result<Html, ParseError> {
    let text = String::from_utf8_lossy(body);
    if !text.contains('<') {
        return Err(ParseError::MalformedDocument {
            url: url.to_string(),
        });
    }
    Ok(Html::parse_document(&text))
}

/// Resolve `raw` against `base`, keeping only http(s) results.
pub fn resolve_url(base: &Url, raw: &str) -> Option<String> {
    let joined = base.join(raw.trim()).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Reduce a responsive-image candidate list (`a.jpg 1x, b.jpg 2x`) to its
/// first URL. Plain URLs pass through untouched.
pub fn first_srcset_candidate(raw: &str) -> &str {
    let raw = raw.trim();
    if !raw.contains(',') && !raw.contains(char::is_whitespace) {
        return raw;
    }
    let first = raw.split(',').next().unwrap_or(raw);
    first.split_whitespace().next().unwrap_or("")
}

fn resolve_image(base: &Url, raw: &str) -> Option<String> {
    let candidate = first_srcset_candidate(raw);
    if candidate.is_empty() {
        return None;
    }
    resolve_url(base, candidate)
}

/// The normalized title and the element it came from.
fn extract_title<'a>(
    container: ElementRef<'a>,
    profile: &SelectorProfile,
) -> Option<(String, ElementRef<'a>)> {
    let (raw, el) = profile.title.iter().find_map(|css| {
        let el = container.select(css.selector()).next()?;
        let text = normalize_whitespace(&el.text().collect::<String>());
        (text.chars().count() >= profile.title_min_chars).then_some((text, el))
    })?;

    let title = match profile.title_policy {
        TitlePolicy::FirstTerminator => cut_at_terminator(&raw),
        TitlePolicy::Keep => raw,
    };
    // Truncation can leave a fragment that is too short to be a headline.
    (title.chars().count() >= profile.title_min_chars).then_some((title, el))
}

/// `href` of `el` itself or of its first descendant anchor carrying one.
fn first_href(el: ElementRef<'_>) -> Option<&str> {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "a")
        .find_map(|a| a.value().attr("href"))
}

fn extract_link(
    container: ElementRef<'_>,
    title_el: ElementRef<'_>,
    page: &Url,
    profile: &SelectorProfile,
) -> Option<String> {
    let href = match &profile.link {
        LinkRule::Descendant { selector } => container
            .select(selector.selector())
            .find_map(|a| a.value().attr("href")),
        LinkRule::OwnHref => container.value().attr("href"),
        LinkRule::Title => first_href(title_el).or_else(|| first_href(container)),
    }?;
    if href.trim().is_empty() {
        return None;
    }
    let link = resolve_url(page, href)?;

    if let Some(filter) = &profile.link_filter {
        let path = Url::parse(&link).ok()?.path().to_string();
        if !filter.accepts(&path) {
            trace!(%link, "Rejected non-article link");
            return None;
        }
    }
    Some(link)
}

/// Recover one article from a listing container.
pub fn extract_listing(
    container: ElementRef<'_>,
    page: &Url,
    profile: &SelectorProfile,
) -> Option<ArticleDraft> {
    let (title, title_el) = extract_title(container, profile)?;
    let url = extract_link(container, title_el, page, profile)?;

    let image_url = first_match(&profile.image, container).and_then(|raw| resolve_image(page, &raw));
    let description = first_match(&profile.description, container)
        .map(|d| cap_chars(&d, profile.description_max_chars));

    Some(ArticleDraft {
        title,
        url,
        image_url,
        description,
    })
}

/// Recover image and description from an article's own page.
///
/// Image and description chains are evaluated independently; either may be
/// missing from the patch.
pub fn extract_details(
    document: &Html,
    page: &Url,
    enrichment: &EnrichmentProfile,
    description_max_chars: usize,
) -> DetailPatch {
    let root = document.root_element();
    DetailPatch {
        image_url: first_match(&enrichment.image, root).and_then(|raw| resolve_image(page, &raw)),
        description: first_match(&enrichment.description, root)
            .map(|d| normalize_whitespace(&d))
            .filter(|d| !d.is_empty())
            .map(|d| cap_chars(&d, description_max_chars)),
    }
}
