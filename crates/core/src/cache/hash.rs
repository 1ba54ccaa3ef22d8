//! Cache key generation for page details.

use sha2::{Digest, Sha256};

/// Compute the cache key for a page detail.
///
/// The score stored in a detail depends on the query, so the query is part
/// of the key alongside the URL.
pub fn compute_cache_key(url: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}
