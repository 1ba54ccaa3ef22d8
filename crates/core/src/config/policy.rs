//! Policy enums that select how pages are fetched and aggregated.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A retrieval strategy capable of producing HTML for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Full headless browser engine.
    Renderer,
    /// External JS-rendering HTTP service.
    ProxyRender,
    /// Direct HTTP GET.
    Plain,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Renderer => "renderer",
            StrategyKind::ProxyRender => "proxy_render",
            StrategyKind::Plain => "plain",
        };
        f.write_str(name)
    }
}

/// How the orchestrator composes strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Run the race set concurrently, first non-empty result wins.
    #[default]
    Race,
    /// Try tiers one after another in priority order.
    Tiered,
    /// Use the headless browser only.
    Browser,
}

/// Whether a session scrapes only the seed page or also its internal links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrawlMode {
    /// Seed page detail only.
    #[default]
    Single,
    /// Detail for every internal link found on the seed page.
    Links,
}

/// Which qualifying images to keep once the cap is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImagePolicy {
    /// Keep the first images in document order.
    #[default]
    First,
    /// Keep the last images in document order.
    Last,
}
