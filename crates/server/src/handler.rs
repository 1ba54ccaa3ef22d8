//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{WebScrapeParams, purge_impl, scrape_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use webrace_client::Scraper;

/// The main MCP server handler for webrace.
#[derive(Clone)]
pub struct WebraceServer {
    scraper: Scraper,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl WebraceServer {
    /// Create a new server handler around a configured scraper.
    pub fn new(scraper: Scraper) -> Self {
        Self { scraper, tool_router: Self::tool_router() }
    }

    /// Scrape one or more URLs.
    ///
    /// Each URL is fetched by racing or chaining the configured strategies, then
    /// scored against the query. Failures are reported per URL.
    #[tool(
        description = "Scrape one or more URLs. Returns per-URL title, snippet, full text and query similarity score, optionally with images or crawled internal links."
    )]
    async fn web_scrape(&self, params: Parameters<WebScrapeParams>) -> Result<CallToolResult, McpError> {
        scrape_impl(&self.scraper, params.0).await
    }

    /// Remove expired entries from the result cache.
    #[tool(description = "Remove expired entries from the scrape result cache. Returns removed and remaining counts.")]
    async fn cache_purge(&self) -> Result<CallToolResult, McpError> {
        purge_impl(self.scraper.cache()).await
    }
}

impl ServerHandler for WebraceServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "webrace".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
