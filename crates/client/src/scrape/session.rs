//! Top-level scrape requests.
//!
//! A session fetches the seed page once, optionally harvests its images, then
//! either scores the seed page alone or crawls its internal links. Batches run
//! one session per URL concurrently and keep input order.

use std::sync::Arc;

use scraper::Html;
use tokio::task::JoinSet;
use tokio::time::Instant;
use webrace_core::{AppConfig, CrawlMode, Error, FetchMode, ResultCache, StrategyKind};

use super::detail::round_to;
use super::{CrawlCoordinator, PageDetail, PageDetailScraper, PageResults, ScrapeOutcome, ScrapeResult};
use crate::extract::{ImageExtractor, LinkExtractor};
use crate::fetch::{FetchOrchestrator, FetchPolicy, FetchStrategy, PlainFetch, ProxyRenderFetch, canonicalize};
use crate::render::Renderer;

/// Per-request knobs; unset modes fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub query: String,
    pub include_images: bool,
    pub mode: Option<FetchMode>,
    pub crawl: Option<CrawlMode>,
}

/// Entry point for scrape requests.
///
/// Cheap to clone; clones share the result cache and browser pool.
#[derive(Clone)]
pub struct Scraper {
    details: PageDetailScraper,
    crawler: CrawlCoordinator,
    images: ImageExtractor,
    crawl_mode: CrawlMode,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Scraper {
    pub fn new(
        orchestrator: FetchOrchestrator, cache: ResultCache<PageDetail>, links: LinkExtractor,
        images: ImageExtractor, crawl_mode: CrawlMode, crawl_concurrency: usize,
    ) -> Self {
        let details = PageDetailScraper::new(orchestrator, cache);
        let crawler = CrawlCoordinator::new(details.clone(), links, crawl_concurrency);
        Self { details, crawler, images, crawl_mode, renderer: None }
    }

    /// Wire up every available strategy from configuration.
    ///
    /// The headless renderer is included when the `render` feature is built
    /// and `render_enabled` is set.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        #[cfg_attr(not(feature = "render"), allow(unused_mut))]
        let mut strategies: Vec<Arc<dyn FetchStrategy>> = vec![
            Arc::new(ProxyRenderFetch::from_config(config)?),
            Arc::new(PlainFetch::from_config(config)?),
        ];

        #[cfg_attr(not(feature = "render"), allow(unused_mut))]
        let mut renderer: Option<Arc<dyn Renderer>> = None;

        #[cfg(feature = "render")]
        if config.render_enabled {
            let headless: Arc<dyn Renderer> = Arc::new(crate::render::HeadlessRenderer::new(
                config.render_pool_size,
                config.user_agents.clone(),
            ));
            strategies.push(Arc::new(crate::fetch::RendererFetch::from_config(Arc::clone(&headless), config)));
            renderer = Some(headless);
        }

        let policy = FetchPolicy::from_config(config);
        if policy.mode == FetchMode::Browser && strategies.iter().all(|s| s.kind() != StrategyKind::Renderer) {
            tracing::error!("browser fetch mode requires the headless renderer");
            return Err(Error::RenderDisabled);
        }

        let mut scraper = Self::new(
            FetchOrchestrator::new(strategies, policy),
            ResultCache::new(config.cache_ttl()),
            LinkExtractor::new(config.max_links, config.max_link_extract()),
            ImageExtractor::new(config.image_cap, config.image_policy),
            config.crawl_mode,
            config.crawl_concurrency,
        );
        scraper.renderer = renderer;
        Ok(scraper)
    }

    pub fn cache(&self) -> &ResultCache<PageDetail> {
        self.details.cache()
    }

    /// Whether renders can go through a headless browser.
    pub fn has_renderer(&self) -> bool {
        self.details.orchestrator().has_strategy(StrategyKind::Renderer)
    }

    /// Close pooled browsers. Renders requested afterwards come back empty.
    pub fn shutdown(&self) {
        if let Some(renderer) = &self.renderer {
            tracing::info!("shutting down headless renderer");
            renderer.shutdown();
        }
    }

    /// Scrape one URL.
    pub async fn scrape(&self, url: &str, opts: &SessionOptions) -> ScrapeOutcome {
        let start = Instant::now();

        let url = match canonicalize(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("rejected url {:?}: {}", url, e);
                return ScrapeOutcome::failed(format!("unable to retrieve content for {url}"));
            }
        };

        let (details, crawler) = match opts.mode {
            Some(mode) if mode != self.details.orchestrator().policy().mode => {
                let details = self.details.with_orchestrator(self.details.orchestrator().with_mode(mode));
                let crawler = self.crawler.with_scraper(details.clone());
                (details, crawler)
            }
            _ => (self.details.clone(), self.crawler.clone()),
        };

        let fetched = details.orchestrator().fetch(&url).await;
        if fetched.is_empty() {
            return ScrapeOutcome::failed(format!("unable to retrieve content for {url}"));
        }

        let images = if opts.include_images {
            let document = Html::parse_document(&fetched.html);
            self.images.extract(&document, &url)
        } else {
            Vec::new()
        };

        let results = match opts.crawl.unwrap_or(self.crawl_mode) {
            CrawlMode::Single => PageResults::Single(details.scrape_html(&url, &fetched.html, &opts.query).await),
            CrawlMode::Links => PageResults::Many(crawler.crawl(&url, &fetched.html, &opts.query).await),
        };

        let response_time = round_to(start.elapsed().as_secs_f64(), 2);
        tracing::info!(url = %url, strategy = ?fetched.strategy_used, response_time, "scrape complete");

        ScrapeOutcome::Success(ScrapeResult { query: opts.query.clone(), images, results, response_time })
    }

    /// Scrape several URLs concurrently; outcomes keep the input order.
    pub async fn scrape_all(&self, urls: &[String], opts: &SessionOptions) -> Vec<ScrapeOutcome> {
        let mut join_set = JoinSet::new();
        for (index, url) in urls.iter().enumerate() {
            let scraper = self.clone();
            let url = url.clone();
            let opts = opts.clone();
            join_set.spawn(async move { (index, scraper.scrape(&url, &opts).await) });
        }

        let mut outcomes: Vec<Option<ScrapeOutcome>> = vec![None; urls.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::warn!("scrape task failed: {e}"),
            }
        }

        outcomes
            .into_iter()
            .zip(urls)
            .map(|(outcome, url)| {
                outcome.unwrap_or_else(|| ScrapeOutcome::failed(format!("unable to retrieve content for {url}")))
            })
            .collect()
    }
}
