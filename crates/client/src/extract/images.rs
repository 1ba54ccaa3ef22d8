//! Content image harvesting.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;
use webrace_core::ImagePolicy;

static IMAGES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").expect("invalid selector"));

const DISALLOWED_EXTENSIONS: &[&str] = &[".svg"];
const DISALLOWED_KEYWORDS: &[&str] = &["logo", "icon"];

/// Default number of images returned per page.
pub const DEFAULT_IMAGE_CAP: usize = 5;

/// Collects absolute image URLs, skipping vector art, logos and icons.
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    cap: usize,
    policy: ImagePolicy,
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_CAP, ImagePolicy::First)
    }
}

impl ImageExtractor {
    pub fn new(cap: usize, policy: ImagePolicy) -> Self {
        Self { cap: cap.min(DEFAULT_IMAGE_CAP), policy }
    }

    pub fn extract(&self, document: &Html, base: &Url) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for element in document.select(&IMAGES) {
            if self.policy == ImagePolicy::First && images.len() >= self.cap {
                break;
            }

            let Some(src) = element.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };

            let Ok(resolved) = base.join(src) else { continue };
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }

            let full = resolved.to_string();
            if !is_allowed(&full) {
                continue;
            }

            if seen.insert(full.clone()) {
                images.push(full);
            }
        }

        if self.policy == ImagePolicy::Last && images.len() > self.cap {
            images.drain(..images.len() - self.cap);
        }

        images
    }
}

fn is_allowed(url: &str) -> bool {
    let lower = url.to_lowercase();
    !DISALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        && !DISALLOWED_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
