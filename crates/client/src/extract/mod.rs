//! Structured information pulled out of fetched HTML.
//!
//! - Title and visible text of a page
//! - Same-domain links (`links`)
//! - Content images (`images`)
//! - Relevance of page text to a query (`similarity`)
//! - Bot-wall detection

pub mod images;
pub mod links;
pub mod similarity;

pub use images::ImageExtractor;
pub use links::{LinkExtractor, domain_prefix};
pub use similarity::similarity;

use std::sync::LazyLock;

use scraper::{Html, Node, Selector};

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("invalid selector"));

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Phrases that only show up on interstitial bot checks.
const BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "verify you are human",
    "verify that you are human",
    "are you a robot",
    "unusual traffic from your computer",
];

/// Pages longer than this are treated as real content even if they mention a marker.
const BLOCK_PAGE_MAX_CHARS: usize = 2_000;

/// Title and text of a parsed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// First `<title>`, trimmed; empty if absent.
    pub title: String,
    /// Visible text, whitespace collapsed to single spaces.
    pub text: String,
}

impl ParsedPage {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self::from_document(&document)
    }

    pub fn from_document(document: &Html) -> Self {
        Self { title: page_title(document), text: visible_text(document) }
    }

    /// True when the page carries nothing worth scoring.
    pub fn is_unusable(&self) -> bool {
        self.text.is_empty() || is_blocked(&self.text)
    }
}

pub fn page_title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// All text nodes outside script/style-like elements, whitespace collapsed.
pub fn visible_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else { continue };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

/// Detect captcha and "are you human" interstitials.
pub fn is_blocked(text: &str) -> bool {
    if text.chars().count() > BLOCK_PAGE_MAX_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lower.contains(marker))
}
