//! Internal link harvesting from HTML documents.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use url::Url;

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector"));

/// Origin of `base` with a trailing slash, e.g. `https://example.com/`.
///
/// Links are internal when their absolute form starts with this prefix.
pub fn domain_prefix(base: &Url) -> String {
    format!("{}/", base.origin().ascii_serialization())
}

/// Collects same-domain, fragment-free links from a page.
///
/// Extraction stops early once `max_links` links are collected or
/// `max_duration` has elapsed; whatever was collected so far is returned.
#[derive(Debug, Clone, Default)]
pub struct LinkExtractor {
    max_links: Option<usize>,
    max_duration: Option<Duration>,
}

impl LinkExtractor {
    pub fn new(max_links: Option<usize>, max_duration: Option<Duration>) -> Self {
        Self { max_links, max_duration }
    }

    /// Extract internal links from `document`, resolving relative hrefs against `base`.
    ///
    /// Duplicates are removed; order follows first appearance.
    pub fn extract(&self, document: &Html, base: &Url) -> Vec<String> {
        let started = Instant::now();
        let prefix = domain_prefix(base);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&ANCHORS) {
            if self.max_links.is_some_and(|max| links.len() >= max) {
                tracing::debug!("link cap reached for {}", base);
                break;
            }
            if self.max_duration.is_some_and(|max| started.elapsed() >= max) {
                tracing::debug!("link extraction time cap reached for {}", base);
                break;
            }

            let Some(href) = element.value().attr("href") else { continue };

            let resolved = match base.join(href.trim()) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            };

            if !resolved.starts_with(&prefix) || resolved.contains('#') {
                continue;
            }

            if seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }

        links
    }
}
