//! Core types and shared functionality for webrace.
//!
//! This crate provides:
//! - Layered configuration and the policy enums it selects
//! - Unified error types
//! - The TTL result cache and single-flight registry

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{InFlight, ResultCache, compute_cache_key};
pub use config::{AppConfig, ConfigError, CrawlMode, FetchMode, ImagePolicy, StrategyKind};
pub use error::Error;
