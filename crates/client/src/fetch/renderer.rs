//! Headless browser strategy.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use webrace_core::{AppConfig, Error, StrategyKind};

use super::FetchStrategy;
use crate::render::{RenderOptions, RenderedPage, Renderer};

/// Renders pages in a headless browser.
///
/// If the direct render fails and an upstream proxy is configured, the render
/// is retried once through that proxy.
pub struct RendererFetch {
    renderer: Arc<dyn Renderer>,
    opts: RenderOptions,
    upstream_proxy: Option<String>,
}

impl RendererFetch {
    pub fn new(renderer: Arc<dyn Renderer>, opts: RenderOptions, upstream_proxy: Option<String>) -> Self {
        Self { renderer, opts: RenderOptions { proxy: None, ..opts }, upstream_proxy }
    }

    pub fn from_config(renderer: Arc<dyn Renderer>, config: &AppConfig) -> Self {
        let opts = RenderOptions { timeout: config.render_timeout(), settle: config.render_settle(), proxy: None };
        Self::new(renderer, opts, config.upstream_proxy.clone())
    }
}

#[async_trait::async_trait]
impl FetchStrategy for RendererFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Renderer
    }

    fn timeout(&self) -> Duration {
        let attempt = self.opts.timeout + self.opts.settle;
        if self.upstream_proxy.is_some() { attempt * 2 } else { attempt }
    }

    async fn try_fetch(&self, url: &Url) -> Result<String, Error> {
        let direct = match self.renderer.render(url, &self.opts).await {
            Ok(page) => return Ok(rendered_html(url, page)),
            Err(e) => e,
        };

        let Some(proxy) = &self.upstream_proxy else {
            return Err(Error::RenderFailed(direct.to_string()));
        };

        tracing::warn!(url = %url, "direct render failed ({direct}), retrying through upstream proxy");

        let opts = RenderOptions { proxy: Some(proxy.clone()), ..self.opts.clone() };
        self.renderer
            .render(url, &opts)
            .await
            .map(|page| rendered_html(url, page))
            .map_err(|e| Error::RenderFailed(format!("direct: {direct}; proxied: {e}")))
    }
}

fn rendered_html(url: &Url, page: RenderedPage) -> String {
    if page.final_url.as_str() != url.as_str() {
        tracing::debug!("{} redirected to {}", url, page.final_url);
    }
    tracing::debug!(url = %url, render_time_ms = page.render_time_ms, "page rendered");
    page.html
}
