//! Headless browser rendering for JS-heavy pages.
//!
//! This module provides the renderer trait, a bounded resource pool for
//! browser instances, and (behind the `render` feature) an implementation
//! using chromiumoxide for headless Chrome/Chromium control.

#[cfg(feature = "render")]
mod headless;
pub mod pool;

#[cfg(feature = "render")]
pub use headless::HeadlessRenderer;
pub use pool::{PoolClosed, Pooled, ResourcePool};

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to get page content.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// The browser pool has been shut down.
    #[error("browser pool closed")]
    PoolClosed,
}

impl From<PoolClosed> for RenderError {
    fn from(_: PoolClosed) -> Self {
        RenderError::PoolClosed
    }
}

/// Options for rendering a page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Navigation timeout (default: 15s).
    pub timeout: Duration,

    /// Extra delay after navigation so late scripts can settle (default: 1s).
    pub settle: Duration,

    /// Upstream network proxy for this render, if any.
    pub proxy: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(15), settle: Duration::from_secs(1), proxy: None }
    }
}

/// Result of rendering a page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Serialized DOM after rendering.
    pub html: String,

    /// Final URL after redirects.
    pub final_url: Url,

    /// Time taken to render in milliseconds.
    pub render_time_ms: u64,
}

/// Renderer trait for headless browser page rendering.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Render a URL to HTML via headless browser.
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError>;

    /// Release browser resources. Renders started afterwards fail.
    fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_default() {
        let opts = RenderOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(15));
        assert_eq!(opts.settle, Duration::from_secs(1));
        assert!(opts.proxy.is_none());
    }

    #[test]
    fn test_pool_closed_maps_to_render_error() {
        let err: RenderError = PoolClosed.into();
        assert!(matches!(err, RenderError::PoolClosed));
        assert_eq!(RenderError::Timeout(15000).to_string(), "render timeout after 15000ms");
    }
}
