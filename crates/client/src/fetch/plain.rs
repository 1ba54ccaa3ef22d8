//! Direct HTTP GET strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url, header};
use webrace_core::{AppConfig, Error, StrategyKind};

use super::{DEFAULT_USER_AGENT, FetchStrategy, transport_error};

/// Plain GET with a User-Agent rotated round-robin per request.
pub struct PlainFetch {
    http: Client,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
    timeout: Duration,
}

impl PlainFetch {
    pub fn new(user_agents: Vec<String>, timeout: Duration) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, user_agents, next_agent: AtomicUsize::new(0), timeout })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(config.user_agents.clone(), config.plain_timeout())
    }

    fn next_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENT;
        }
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        &self.user_agents[idx]
    }
}

#[async_trait::async_trait]
impl FetchStrategy for PlainFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Plain
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch(&self, url: &Url) -> Result<String, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::USER_AGENT, self.next_user_agent())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        let body = response.text().await.map_err(transport_error)?;

        tracing::debug!("plain fetch {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), body.len());

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(agents: &[&str]) -> PlainFetch {
        PlainFetch::new(agents.iter().map(|a| a.to_string()).collect(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_user_agent_rotation() {
        let fetch = client(&["ua-1", "ua-2"]);
        assert_eq!(fetch.next_user_agent(), "ua-1");
        assert_eq!(fetch.next_user_agent(), "ua-2");
        assert_eq!(fetch.next_user_agent(), "ua-1");
    }

    #[test]
    fn test_default_user_agent_when_none_configured() {
        let fetch = client(&[]);
        assert_eq!(fetch.next_user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_from_config() {
        let fetch = PlainFetch::from_config(&AppConfig::default()).unwrap();
        assert_eq!(fetch.timeout(), Duration::from_secs(10));
        assert_eq!(fetch.kind(), StrategyKind::Plain);
    }

    #[tokio::test]
    async fn test_fetch_ok_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header_eq("user-agent", "ua-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hi</body></html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let html = client(&["ua-1"]).fetch(&url).await;
        assert!(html.contains("hi"));
    }

    #[tokio::test]
    async fn test_non_200_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();
        let fetch = client(&["ua"]);
        assert!(matches!(fetch.try_fetch(&url).await, Err(Error::HttpError(_))));
        assert_eq!(fetch.fetch(&url).await, "");
    }

    #[tokio::test]
    async fn test_timeout_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetch = PlainFetch::new(vec!["ua".into()], Duration::from_millis(200)).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert!(matches!(fetch.try_fetch(&url).await, Err(Error::FetchTimeout(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_empty() {
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        assert_eq!(client(&["ua"]).fetch(&url).await, "");
    }
}
