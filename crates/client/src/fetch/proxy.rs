//! Strategy that delegates rendering to an external JS-rendering service.
//!
//! The service is called as `GET <endpoint>?url=<target>&wait=<s>&timeout=<s>`
//! and answers with the rendered HTML on HTTP 200.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url};
use webrace_core::{AppConfig, Error, StrategyKind};

use super::{FetchStrategy, transport_error};

/// Client for the JS-rendering service.
pub struct ProxyRenderFetch {
    http: Client,
    endpoint: String,
    wait_secs: u64,
    render_timeout_secs: u64,
    timeout: Duration,
}

impl ProxyRenderFetch {
    /// Create a client for the service at `endpoint`.
    ///
    /// `wait_secs` and `render_timeout_secs` are forwarded to the service;
    /// `timeout` bounds the HTTP exchange itself.
    pub fn new(endpoint: &str, wait_secs: u64, render_timeout_secs: u64, timeout: Duration) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ProxyRenderFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, endpoint: endpoint.to_string(), wait_secs, render_timeout_secs, timeout })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(
            &config.proxy_render_url,
            config.proxy_render_wait_secs,
            config.proxy_render_timeout_secs,
            config.proxy_render_http_timeout(),
        )
    }
}

#[async_trait::async_trait]
impl FetchStrategy for ProxyRenderFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProxyRender
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch(&self, url: &Url) -> Result<String, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("url", url.to_string()),
                ("wait", self.wait_secs.to_string()),
                ("timeout", self.render_timeout_secs.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::ProxyRenderFailed(format!("status {}: {}", status.as_u16(), message.trim())));
        }

        let body = response.text().await.map_err(transport_error)?;

        tracing::debug!("proxy render {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), body.len());

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ProxyRenderFetch {
        ProxyRenderFetch::new(&format!("{}/render.html", server.uri()), 2, 10, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_from_config() {
        let fetch = ProxyRenderFetch::from_config(&AppConfig::default()).unwrap();
        assert_eq!(fetch.endpoint, "http://localhost:8050/render.html");
        assert_eq!(fetch.wait_secs, 2);
        assert_eq!(fetch.render_timeout_secs, 10);
        assert_eq!(fetch.timeout(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_forwards_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/render.html"))
            .and(query_param("url", "https://example.com/app"))
            .and(query_param("wait", "2"))
            .and(query_param("timeout", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>rendered</body></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let target = Url::parse("https://example.com/app").unwrap();
        let html = client(&server).fetch(&target).await;
        assert!(html.contains("rendered"));
    }

    #[tokio::test]
    async fn test_service_error_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("render failed"))
            .mount(&server)
            .await;

        let target = Url::parse("https://example.com").unwrap();
        let fetch = client(&server);
        let err = fetch.try_fetch(&target).await.unwrap_err();
        assert!(err.to_string().contains("502"));
        assert_eq!(fetch.fetch(&target).await, "");
    }

    #[tokio::test]
    async fn test_service_unreachable_is_empty() {
        let fetch = ProxyRenderFetch::new("http://127.0.0.1:9/render.html", 2, 10, Duration::from_secs(1)).unwrap();
        let target = Url::parse("https://example.com").unwrap();
        assert_eq!(fetch.fetch(&target).await, "");
    }
}
