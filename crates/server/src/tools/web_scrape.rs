//! web_scrape tool implementation.
//!
//! Scrapes one or more URLs concurrently through the fetch orchestrator and
//! returns one result per URL, in input order.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use webrace_client::{ScrapeOutcome, Scraper, SessionOptions};
use webrace_core::{CrawlMode, Error, FetchMode};

/// Input parameters for web_scrape tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WebScrapeParams {
    /// URLs to scrape. Must not be empty.
    pub urls: Vec<String>,

    /// Text to score each page against. Scores are 0 when empty.
    #[serde(default)]
    pub query: String,

    /// Include up to five content image URLs from each seed page.
    #[serde(default)]
    pub include_images: bool,

    /// Fetch mode: "race", "tiered" or "browser". Defaults to the server configuration.
    #[serde(default)]
    pub mode: Option<FetchMode>,

    /// "single" scores the seed page; "links" scores every internal link instead.
    #[serde(default)]
    pub crawl: Option<CrawlMode>,
}

/// Output structure for web_scrape tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebScrapeOutput {
    /// One entry per input URL, in input order.
    pub results: Vec<ScrapeOutcome>,
}

/// Implementation of the web_scrape tool.
pub async fn scrape_impl(scraper: &Scraper, params: WebScrapeParams) -> Result<CallToolResult, McpError> {
    if params.urls.is_empty() {
        return Err(Error::InvalidInput("urls cannot be empty".into()).into());
    }
    if params.mode == Some(FetchMode::Browser) && !scraper.has_renderer() {
        return Err(Error::RenderDisabled.into());
    }

    tracing::info!(count = params.urls.len(), mode = ?params.mode, crawl = ?params.crawl, "web_scrape");

    let opts = SessionOptions {
        query: params.query,
        include_images: params.include_images,
        mode: params.mode,
        crawl: params.crawl,
    };
    let results = scraper.scrape_all(&params.urls, &opts).await;

    let output = WebScrapeOutput { results };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| McpError::internal_error(format!("failed to serialize output: {e}"), None))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrace_core::{AppConfig, StrategyKind};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scraper() -> Scraper {
        let config = AppConfig {
            render_enabled: false,
            fetch_mode: FetchMode::Tiered,
            tiers: vec![StrategyKind::Plain],
            self_heal: false,
            ..AppConfig::default()
        };
        Scraper::from_config(&config).unwrap()
    }

    fn output_of(result: &CallToolResult) -> serde_json::Value {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_empty_urls() {
        let result = scrape_impl(&scraper(), WebScrapeParams::default()).await;

        let err = result.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("urls cannot be empty"));
    }

    #[tokio::test]
    async fn test_browser_mode_without_renderer_is_rejected() {
        let params = WebScrapeParams {
            urls: vec!["https://example.com".into()],
            mode: Some(FetchMode::Browser),
            ..Default::default()
        };

        let err = scrape_impl(&scraper(), params).await.unwrap_err();

        assert_eq!(err.code.0, -32011);
        assert!(err.message.contains("RENDER_DISABLED"));
    }

    #[tokio::test]
    async fn test_scrape_results_in_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><head><title>Page</title></head><body>hello world</body></html>"),
            )
            .mount(&server)
            .await;

        let params = WebScrapeParams {
            urls: vec![format!("{}/page", server.uri()), "not a url".into()],
            query: "hello".into(),
            ..Default::default()
        };
        let output = output_of(&scrape_impl(&scraper(), params).await.unwrap());

        let results = output["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["query"], "hello");
        assert_eq!(results[0]["results"]["title"], "Page");
        assert_eq!(results[0]["results"]["content"], "Page hello world");
        assert!(results[0]["images"].as_array().unwrap().is_empty());
        assert!(results[1]["error"].as_str().unwrap().starts_with("unable to retrieve content for"));
    }

    #[test]
    fn test_params_defaults() {
        let params: WebScrapeParams = serde_json::from_str(r#"{"urls": ["https://example.com"]}"#).unwrap();
        assert_eq!(params.query, "");
        assert!(!params.include_images);
        assert!(params.mode.is_none());
        assert!(params.crawl.is_none());
    }

    #[test]
    fn test_params_modes_snake_case() {
        let params: WebScrapeParams =
            serde_json::from_str(r#"{"urls": ["a"], "mode": "race", "crawl": "links"}"#).unwrap();
        assert_eq!(params.mode, Some(FetchMode::Race));
        assert_eq!(params.crawl, Some(CrawlMode::Links));
    }
}
