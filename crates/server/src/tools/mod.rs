//! MCP tool implementations.
//!
//! This module contains all tools exposed by the webrace server.

pub mod cache_purge;
pub mod web_scrape;

pub use cache_purge::purge_impl;
pub use web_scrape::{WebScrapeParams, scrape_impl};
