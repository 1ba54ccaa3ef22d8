//! Page detail computation behind the result cache.

use reqwest::Url;
use webrace_core::{InFlight, ResultCache, compute_cache_key};

use super::PageDetail;
use crate::extract::{ParsedPage, similarity};
use crate::fetch::FetchOrchestrator;

/// Snippet length before the ellipsis is appended.
pub const SNIPPET_CHARS: usize = 200;

/// Build a [`PageDetail`] from fetched HTML.
///
/// Empty HTML yields an all-empty detail that still carries the URL.
pub fn build_detail(url: &Url, html: &str, query: &str) -> PageDetail {
    if html.trim().is_empty() {
        return PageDetail { url: url.to_string(), ..Default::default() };
    }

    let page = ParsedPage::parse(html);
    let snippet = if page.text.chars().count() > SNIPPET_CHARS {
        let head: String = page.text.chars().take(SNIPPET_CHARS).collect();
        format!("{head}...")
    } else {
        page.text.clone()
    };

    let score = if query.is_empty() { 0.0 } else { round_to(similarity(query, &page.text), 8) };

    PageDetail { title: page.title, url: url.to_string(), snippet, score, raw_content: page.text }
}

/// [`build_detail`] on the blocking pool, off the async workers.
async fn build_detail_blocking(url: &Url, html: String, query: &str) -> PageDetail {
    let (page_url, page_query) = (url.clone(), query.to_owned());
    let built = tokio::task::spawn_blocking(move || build_detail(&page_url, &html, &page_query)).await;

    match built {
        Ok(detail) => detail,
        Err(e) => {
            tracing::warn!("building detail for {} failed: {}", url, e);
            PageDetail { url: url.to_string(), ..Default::default() }
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Fetches and scores pages, consulting the shared cache first.
///
/// Concurrent misses for the same URL and query share one fetch.
#[derive(Clone)]
pub struct PageDetailScraper {
    orchestrator: FetchOrchestrator,
    cache: ResultCache<PageDetail>,
    inflight: InFlight<PageDetail>,
}

impl PageDetailScraper {
    pub fn new(orchestrator: FetchOrchestrator, cache: ResultCache<PageDetail>) -> Self {
        Self { orchestrator, cache, inflight: InFlight::new() }
    }

    /// Same cache and in-flight registry, different orchestrator.
    pub fn with_orchestrator(&self, orchestrator: FetchOrchestrator) -> Self {
        Self { orchestrator, cache: self.cache.clone(), inflight: self.inflight.clone() }
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &ResultCache<PageDetail> {
        &self.cache
    }

    /// Detail for `url`, fetched through the orchestrator on a cache miss.
    pub async fn scrape(&self, url: &Url, query: &str) -> PageDetail {
        let key = compute_cache_key(url.as_str(), query);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!("cache hit for {}", url);
            return hit;
        }

        let (orchestrator, cache, cache_key) = (&self.orchestrator, &self.cache, key.as_str());
        self.inflight
            .run(cache_key, || async move {
                let fetched = orchestrator.fetch(url).await;
                let detail = build_detail_blocking(url, fetched.html, query).await;
                cache.set(cache_key, detail.clone()).await;
                detail
            })
            .await
    }

    /// Detail for `url` from HTML already in hand; the cache is still consulted and filled.
    pub async fn scrape_html(&self, url: &Url, html: &str, query: &str) -> PageDetail {
        let key = compute_cache_key(url.as_str(), query);
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        let detail = build_detail_blocking(url, html.to_owned(), query).await;
        self.cache.set(key, detail.clone()).await;
        detail
    }
}
