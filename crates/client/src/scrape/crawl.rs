//! Bounded-concurrency fan-out over a seed page's internal links.

use std::sync::Arc;

use reqwest::Url;
use scraper::Html;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{PageDetail, PageDetailScraper};
use crate::extract::LinkExtractor;

/// Scrapes every internal link of a page, at most `concurrency` at a time.
#[derive(Clone)]
pub struct CrawlCoordinator {
    scraper: PageDetailScraper,
    links: LinkExtractor,
    concurrency: usize,
}

impl CrawlCoordinator {
    pub fn new(scraper: PageDetailScraper, links: LinkExtractor, concurrency: usize) -> Self {
        Self { scraper, links, concurrency: concurrency.max(1) }
    }

    pub fn with_scraper(&self, scraper: PageDetailScraper) -> Self {
        Self { scraper, ..self.clone() }
    }

    /// Extract internal links from `seed_html` and scrape each of them.
    ///
    /// Completion order is not preserved.
    pub async fn crawl(&self, seed: &Url, seed_html: &str, query: &str) -> Vec<PageDetail> {
        let links = {
            let document = Html::parse_document(seed_html);
            self.links.extract(&document, seed)
        };
        tracing::debug!("found {} internal links on {}", links.len(), seed);

        self.crawl_links(links, query).await
    }

    pub async fn crawl_links(&self, links: Vec<String>, query: &str) -> Vec<PageDetail> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for link in links {
            let url = match Url::parse(&link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("skipping unparseable link {}: {}", link, e);
                    continue;
                }
            };

            let semaphore = Arc::clone(&semaphore);
            let scraper = self.scraper.clone();
            let query = query.to_string();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                Some(scraper.scrape(&url, &query).await)
            });
        }

        let mut details = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(detail)) => details.push(detail),
                Ok(None) => {}
                Err(e) => tracing::warn!("crawl worker failed: {e}"),
            }
        }

        details
    }
}
