//! Headless Chrome/Chromium renderer using chromiumoxide.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

use super::{RenderError, RenderOptions, RenderedPage, Renderer, ResourcePool};

/// A launched browser together with its CDP event loop.
struct ManagedBrowser {
    browser: Browser,
    events: JoinHandle<()>,
}

impl Drop for ManagedBrowser {
    fn drop(&mut self) {
        self.events.abort();
    }
}

/// Headless renderer backed by a bounded pool of browser instances.
///
/// Browsers are launched lazily on first use and reused across renders.
/// Renders through an upstream proxy get a dedicated browser that is closed
/// afterwards, but still count against the pool size.
pub struct HeadlessRenderer {
    pool: ResourcePool<ManagedBrowser>,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
}

impl HeadlessRenderer {
    /// Create a renderer that keeps at most `pool_size` browsers alive.
    pub fn new(pool_size: usize, user_agents: Vec<String>) -> Self {
        Self { pool: ResourcePool::new(pool_size), user_agents, next_agent: AtomicUsize::new(0) }
    }

    fn user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        Some(self.user_agents[idx].as_str())
    }

    async fn launch(&self, proxy: Option<&str>) -> Result<ManagedBrowser, RenderError> {
        let mut builder = BrowserConfig::builder().no_sandbox().arg("--disable-dev-shm-usage");
        if let Some(ua) = self.user_agent() {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }

        let config = builder.build().map_err(RenderError::BrowserLaunch)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        tracing::debug!(proxied = proxy.is_some(), "launched headless browser");
        Ok(ManagedBrowser { browser, events })
    }

    async fn capture(page: &Page, url: &Url, opts: &RenderOptions) -> Result<(String, Url), RenderError> {
        let navigation = tokio::time::timeout(opts.timeout, async {
            page.goto(url.as_str())
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            Ok::<(), RenderError>(())
        })
        .await;

        match navigation {
            Ok(result) => result?,
            Err(_) => return Err(RenderError::Timeout(opts.timeout.as_millis() as u64)),
        }

        tokio::time::sleep(opts.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let page_url = page
            .url()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;
        let final_url = page_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| url.clone());

        Ok((html, final_url))
    }
}

#[async_trait::async_trait]
impl Renderer for HeadlessRenderer {
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
        let start = Instant::now();

        let mut browser = match opts.proxy.as_deref() {
            Some(proxy) => self.pool.acquire_fresh(|| self.launch(Some(proxy))).await?,
            None => self.pool.acquire(|| self.launch(None)).await?,
        };
        // Until the page is closed, dropping the checkout (cancellation
        // included) closes the browser instead of returning it with a live tab.
        browser.mark_dirty();

        let page = browser
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let captured = Self::capture(&page, url, opts).await;
        let closed = page.close().await.is_ok();
        if closed && matches!(captured, Ok(_) | Err(RenderError::Timeout(_))) {
            browser.mark_clean();
        }

        let (html, final_url) = captured?;
        let render_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("rendered {} -> {} in {}ms ({} bytes)", url, final_url, render_time_ms, html.len());
        Ok(RenderedPage { html, final_url, render_time_ms })
    }

    /// Close idle browsers and refuse further renders.
    fn shutdown(&self) {
        self.pool.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let renderer = HeadlessRenderer::new(1, vec!["a".into(), "b".into()]);
        assert_eq!(renderer.user_agent(), Some("a"));
        assert_eq!(renderer.user_agent(), Some("b"));
        assert_eq!(renderer.user_agent(), Some("a"));
    }

    #[test]
    fn test_no_user_agents() {
        let renderer = HeadlessRenderer::new(1, vec![]);
        assert_eq!(renderer.user_agent(), None);
    }

    #[tokio::test]
    async fn test_render_after_shutdown_fails_without_launching() {
        let renderer = HeadlessRenderer::new(1, vec![]);
        renderer.shutdown();

        let url = Url::parse("https://example.com").unwrap();
        let err = renderer.render(&url, &RenderOptions::default()).await.unwrap_err();

        assert!(matches!(err, RenderError::PoolClosed));
        assert_eq!(renderer.pool.idle(), 0);
    }

    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_render_simple_page() {
        let renderer = HeadlessRenderer::new(1, vec![]);
        let url = Url::parse("https://example.com").unwrap();

        let page = renderer.render(&url, &RenderOptions::default()).await.unwrap();
        assert!(page.html.contains("Example Domain"));
        assert_eq!(page.final_url.as_str(), "https://example.com/");
    }
}
