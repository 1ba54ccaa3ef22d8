//! Interchangeable HTML retrieval strategies and their orchestration.
//!
//! ### Strategies
//! - `PlainFetch`: direct GET with a rotated User-Agent
//! - `ProxyRenderFetch`: GET through a JS-rendering HTTP service
//! - `RendererFetch`: full headless browser, optionally retried via an upstream proxy
//!
//! ### Soft failure
//! A strategy never fails past its boundary. Transport errors, non-200
//! statuses, timeouts and browser launch failures are logged and turned into
//! an empty string.
//!
//! ### Orchestration
//! `FetchOrchestrator` races or chains the strategies according to
//! [`FetchMode`](webrace_core::FetchMode) and owns the self-heal retry.

pub mod orchestrator;
pub mod plain;
pub mod proxy;
pub mod renderer;
pub mod url;

pub use orchestrator::{FetchOrchestrator, FetchPolicy, FetchResult};
pub use plain::PlainFetch;
pub use proxy::ProxyRenderFetch;
pub use renderer::RendererFetch;
pub use url::{UrlError, canonicalize};

use std::time::Duration;

use reqwest::Url;
use webrace_core::{Error, StrategyKind};

/// Fallback User-Agent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "webrace/0.1";

/// A way of retrieving the HTML of a page.
#[async_trait::async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> StrategyKind;

    /// Upper bound the orchestrator allows a single `fetch` call.
    fn timeout(&self) -> Duration;

    /// Retrieve the HTML for `url`, reporting why it failed.
    async fn try_fetch(&self, url: &Url) -> Result<String, Error>;

    /// Retrieve the HTML for `url`, or an empty string on any failure.
    async fn fetch(&self, url: &Url) -> String {
        match self.try_fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(strategy = %self.kind(), url = %url, "fetch failed: {e}");
                String::new()
            }
        }
    }
}

/// Map a reqwest failure onto the unified error type.
pub(crate) fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() { Error::FetchTimeout(e.to_string()) } else { Error::HttpError(format!("network error: {e}")) }
}
