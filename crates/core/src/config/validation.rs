//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, FetchMode, StrategyKind};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 300_000;

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < MIN_TIMEOUT_MS {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
    }
    if value > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid {
            field: field.into(),
            reason: "must not exceed 5 minutes (300000ms)".into(),
        });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `user_agents` is empty or contains an empty entry
    /// - any timeout is below 100ms or above 5 minutes
    /// - the race set or tier order is empty
    /// - `tier_attempts`, `crawl_concurrency`, `render_pool_size` or `image_cap` are out of range
    /// - `proxy_render_url` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agents.is_empty() || self.user_agents.iter().any(|ua| ua.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "user_agents".into(),
                reason: "must contain at least one non-empty entry".into(),
            });
        }

        check_timeout("plain_timeout_ms", self.plain_timeout_ms)?;
        check_timeout("proxy_render_http_timeout_ms", self.proxy_render_http_timeout_ms)?;
        check_timeout("render_timeout_ms", self.render_timeout_ms)?;
        check_timeout("race_deadline_ms", self.race_deadline_ms)?;

        if self.render_settle_ms > 10_000 {
            return Err(ConfigError::Invalid {
                field: "render_settle_ms".into(),
                reason: "must not exceed 10000ms".into(),
            });
        }

        if !self.proxy_render_url.starts_with("http://") && !self.proxy_render_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "proxy_render_url".into(),
                reason: "must be an http or https URL".into(),
            });
        }

        if self.race_strategies.is_empty() {
            return Err(ConfigError::Invalid { field: "race_strategies".into(), reason: "must not be empty".into() });
        }
        if self.tiers.is_empty() {
            return Err(ConfigError::Invalid { field: "tiers".into(), reason: "must not be empty".into() });
        }

        if !(1..=5).contains(&self.tier_attempts) {
            return Err(ConfigError::Invalid { field: "tier_attempts".into(), reason: "must be between 1 and 5".into() });
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "cache_ttl_secs".into(), reason: "must be greater than 0".into() });
        }

        if !(1..=64).contains(&self.crawl_concurrency) {
            return Err(ConfigError::Invalid {
                field: "crawl_concurrency".into(),
                reason: "must be between 1 and 64".into(),
            });
        }

        if !(1..=16).contains(&self.render_pool_size) {
            return Err(ConfigError::Invalid {
                field: "render_pool_size".into(),
                reason: "must be between 1 and 16".into(),
            });
        }

        if !(1..=5).contains(&self.image_cap) {
            return Err(ConfigError::Invalid { field: "image_cap".into(), reason: "must be between 1 and 5".into() });
        }

        if !self.render_enabled {
            let wants_renderer = self.fetch_mode == FetchMode::Browser
                || self.tiers.contains(&StrategyKind::Renderer)
                || self.race_strategies.contains(&StrategyKind::Renderer);
            if wants_renderer {
                tracing::warn!(
                    fetch_mode = ?self.fetch_mode,
                    "render_enabled is false but the renderer is selected; \
                     those attempts will come back empty"
                );
            }
        }

        Ok(())
    }
}
