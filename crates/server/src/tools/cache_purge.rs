//! cache_purge tool implementation.
//!
//! Sweeps expired entries out of the in-process result cache.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use webrace_client::PageDetail;
use webrace_core::ResultCache;

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of expired entries removed.
    pub removed: usize,
    /// Number of live entries left.
    pub remaining: usize,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &ResultCache<PageDetail>) -> Result<CallToolResult, McpError> {
    let removed = cache.clear_expired().await;
    let remaining = cache.len().await;
    tracing::info!(removed, remaining, "cache purged");

    let output = CachePurgeOutput { removed, remaining };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| McpError::internal_error(format!("failed to serialize output: {e}"), None))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output_of(result: &CallToolResult) -> CachePurgeOutput {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_removes_only_expired() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.set("old", PageDetail::default()).await;
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.set("new", PageDetail::default()).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        let output = output_of(&purge_impl(&cache).await.unwrap());

        assert_eq!(output.removed, 1);
        assert_eq!(output.remaining, 1);
    }

    #[tokio::test]
    async fn test_purge_empty_cache() {
        let cache = ResultCache::new(Duration::from_secs(60));
        let output = output_of(&purge_impl(&cache).await.unwrap());
        assert_eq!(output.removed, 0);
        assert_eq!(output.remaining, 0);
    }
}
