//! Client code for webrace.
//!
//! This crate provides the fetch strategies and their orchestration, content
//! extraction, and the scraping pipeline shared by the server and CLI.

pub mod extract;
pub mod fetch;
pub mod render;
pub mod scrape;

pub use extract::{ImageExtractor, LinkExtractor, ParsedPage, similarity};
pub use fetch::{
    FetchOrchestrator, FetchPolicy, FetchResult, FetchStrategy, PlainFetch, ProxyRenderFetch, RendererFetch,
    canonicalize,
};
pub use render::{RenderError, RenderOptions, Renderer};
pub use scrape::{
    CrawlCoordinator, PageDetail, PageDetailScraper, PageResults, ScrapeOutcome, ScrapeResult, Scraper,
    SessionOptions,
};
