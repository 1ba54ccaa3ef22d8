//! Unified error types for webrace.
//!
//! Messages carry a stable code prefix so callers can match on them after
//! they cross the MCP boundary.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the webrace workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., no URLs).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// The JS-rendering service failed or answered with a non-200 status.
    #[error("PROXY_RENDER_FAILED: {0}")]
    ProxyRenderFailed(String),

    /// Render mode is disabled.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Render failed.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::ProxyRenderFailed(msg) => (-32013, msg.clone()),
            Error::RenderDisabled => (-32011, "Render mode is disabled".to_string()),
            Error::RenderFailed(msg) => (-32012, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
