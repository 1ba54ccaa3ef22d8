//! In-process caching for computed page details.
//!
//! - `ResultCache`: TTL store with lazy expiry and an explicit sweep
//! - `InFlight`: single-flight registry so concurrent misses share one computation
//! - `hash`: cache key derivation

pub mod hash;
pub mod inflight;
pub mod ttl;

pub use hash::compute_cache_key;
pub use inflight::InFlight;
pub use ttl::ResultCache;
