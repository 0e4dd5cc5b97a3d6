//! Link extraction from HTML pages
//!
//! Anchors are located with `scraper`'s `a[href]` selection and each `href`
//! is resolved against the page URL. Links are returned in document order
//! and are not deduplicated: the crawl frontier's visited set takes care of
//! repeats.

use scraper::{Html, Selector};
use url::{ParseError, Url};

/// Extracts every anchor link from `html`, resolved against `base_url`
///
/// # Resolution Rules
///
/// - Absolute hrefs (anything with a scheme) pass through unchanged
/// - Relative hrefs are joined to the base URL
/// - An empty href refers to the base URL itself (minus any fragment)
/// - Hrefs that cannot be resolved are skipped
///
/// An unparsable `base_url` yields no links.
///
/// # Example
///
/// ```
/// use sumi_sieve::crawler::extract_links;
///
/// let html = r#"<a href="https://x.com/page1">1</a><a href="/page2">2</a>"#;
/// assert_eq!(
///     extract_links(html, "https://x.com"),
///     vec!["https://x.com/page1", "https://x.com/page2"]
/// );
/// ```
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            tracing::debug!("Cannot resolve links against {}: {}", base_url, e);
            return Vec::new();
        }
    };

    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let links: Vec<String> = document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, &base))
        .collect();

    links
}

/// Resolves one href against the base URL
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    match Url::parse(href) {
        Ok(_) => Some(href.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => match base.join(href) {
            Ok(absolute_url) => Some(absolute_url.to_string()),
            Err(e) => {
                tracing::trace!("Failed to resolve {} against {}: {}", href, base, e);
                None
            }
        },
        Err(e) => {
            tracing::trace!("Skipping malformed href {}: {}", href, e);
            None
        }
    }
}

/// Returns true if the crawler should follow this link (http or https only)
pub(crate) fn is_crawlable(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.scheme() == "http" || u.scheme() == "https")
        .unwrap_or(false)
}
