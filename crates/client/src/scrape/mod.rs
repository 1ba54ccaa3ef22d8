//! Per-URL scraping pipeline and result types.
//!
//! - `detail`: cached title/snippet/score computation for one page
//! - `crawl`: bounded fan-out over a seed page's internal links
//! - `session`: one request per URL, with images, timing and batch support

pub mod crawl;
pub mod detail;
pub mod session;

pub use crawl::CrawlCoordinator;
pub use detail::{PageDetailScraper, SNIPPET_CHARS, build_detail};
pub use session::{Scraper, SessionOptions};

use serde::{Deserialize, Serialize};

/// Extracted information for a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    pub title: String,
    pub url: String,
    /// First characters of the page text, with `...` appended when truncated.
    #[serde(rename = "content")]
    pub snippet: String,
    /// Similarity of the query to the page text, rounded to 8 decimals.
    pub score: f64,
    /// Full whitespace-collapsed page text.
    pub raw_content: String,
}

/// Either the seed page alone or every crawled link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResults {
    Single(PageDetail),
    Many(Vec<PageDetail>),
}

/// Successful result of one scrape request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub query: String,
    pub images: Vec<String>,
    pub results: PageResults,
    /// Seconds from start of request to completion, rounded to 2 decimals.
    pub response_time: f64,
}

/// Per-URL outcome; serializes either as a result object or as `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Success(ScrapeResult),
    Failed { error: String },
}

impl ScrapeOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failed { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_detail_serializes_snippet_as_content() {
        let detail = PageDetail {
            title: "T".into(),
            url: "https://example.com/".into(),
            snippet: "short".into(),
            score: 0.5,
            raw_content: "short".into(),
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "T",
                "url": "https://example.com/",
                "content": "short",
                "score": 0.5,
                "raw_content": "short"
            })
        );
    }

    #[test]
    fn test_failed_outcome_shape() {
        let outcome = ScrapeOutcome::failed("unable to retrieve content for https://x.test/");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"error": "unable to retrieve content for https://x.test/"})
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_many_results_serialize_as_array() {
        let outcome = ScrapeOutcome::Success(ScrapeResult {
            query: "q".into(),
            images: vec![],
            results: PageResults::Many(vec![PageDetail::default()]),
            response_time: 0.12,
        });

        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value["results"].is_array());
        assert_eq!(value["response_time"], json!(0.12));
        assert!(value.get("error").is_none());
    }
}
