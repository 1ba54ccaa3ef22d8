//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WEBRACE_*)
//! 2. TOML config file (if WEBRACE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod policy;
mod validation;

pub use policy::{CrawlMode, FetchMode, ImagePolicy, StrategyKind};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WEBRACE_*)
/// 2. TOML config file (if WEBRACE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent strings rotated across plain fetches and browser launches.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Timeout for the plain HTTP strategy in milliseconds.
    #[serde(default = "default_plain_timeout_ms")]
    pub plain_timeout_ms: u64,

    /// Endpoint of the JS-rendering proxy service.
    #[serde(default = "default_proxy_render_url")]
    pub proxy_render_url: String,

    /// `wait` parameter forwarded to the rendering service, in seconds.
    #[serde(default = "default_proxy_render_wait_secs")]
    pub proxy_render_wait_secs: u64,

    /// `timeout` parameter forwarded to the rendering service, in seconds.
    #[serde(default = "default_proxy_render_timeout_secs")]
    pub proxy_render_timeout_secs: u64,

    /// Transport timeout for calls to the rendering service in milliseconds.
    #[serde(default = "default_proxy_render_http_timeout_ms")]
    pub proxy_render_http_timeout_ms: u64,

    /// Whether the headless browser strategy is available.
    ///
    /// Set via WEBRACE_RENDER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub render_enabled: bool,

    /// Navigation timeout for the headless browser in milliseconds.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Delay after navigation before the DOM is captured, in milliseconds.
    #[serde(default = "default_render_settle_ms")]
    pub render_settle_ms: u64,

    /// Maximum number of browser instances alive at once.
    #[serde(default = "default_render_pool_size")]
    pub render_pool_size: usize,

    /// Upstream network proxy used for one retry when a direct render fails.
    #[serde(default)]
    pub upstream_proxy: Option<String>,

    /// Default composition mode when a request does not name one.
    #[serde(default)]
    pub fetch_mode: FetchMode,

    /// Strategies launched concurrently in race mode.
    #[serde(default = "default_race_strategies")]
    pub race_strategies: Vec<StrategyKind>,

    /// Global deadline for race mode in milliseconds.
    #[serde(default = "default_race_deadline_ms")]
    pub race_deadline_ms: u64,

    /// Priority order for tiered mode.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<StrategyKind>,

    /// Attempts per tier before moving on (1 = move on unconditionally).
    #[serde(default = "default_tier_attempts")]
    pub tier_attempts: u32,

    /// Retry through the renderer once when a cheaper strategy yields no text.
    #[serde(default = "default_true")]
    pub self_heal: bool,

    /// Lifetime of cached page details in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Default crawl mode when a request does not name one.
    #[serde(default)]
    pub crawl_mode: CrawlMode,

    /// Maximum number of in-flight detail scrapes during a crawl.
    #[serde(default = "default_crawl_concurrency")]
    pub crawl_concurrency: usize,

    /// Optional cap on internal links collected from a seed page.
    #[serde(default)]
    pub max_links: Option<usize>,

    /// Optional wall-clock cap on link extraction in milliseconds.
    #[serde(default)]
    pub max_link_extract_ms: Option<u64>,

    /// Maximum number of images returned per seed page.
    #[serde(default = "default_image_cap")]
    pub image_cap: usize,

    /// Which qualifying images are kept once the cap is reached.
    #[serde(default)]
    pub image_policy: ImagePolicy,
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (X11; CrOS x86_64 13729.56.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into(),
        "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.164 Safari/537.36".into(),
    ]
}

fn default_plain_timeout_ms() -> u64 {
    10_000
}

fn default_proxy_render_url() -> String {
    "http://localhost:8050/render.html".into()
}

fn default_proxy_render_wait_secs() -> u64 {
    2
}

fn default_proxy_render_timeout_secs() -> u64 {
    10
}

fn default_proxy_render_http_timeout_ms() -> u64 {
    15_000
}

fn default_render_timeout_ms() -> u64 {
    15_000
}

fn default_render_settle_ms() -> u64 {
    1_000
}

fn default_render_pool_size() -> usize {
    2
}

fn default_race_strategies() -> Vec<StrategyKind> {
    vec![StrategyKind::ProxyRender, StrategyKind::Plain]
}

fn default_race_deadline_ms() -> u64 {
    12_000
}

fn default_tiers() -> Vec<StrategyKind> {
    vec![StrategyKind::ProxyRender, StrategyKind::Plain, StrategyKind::Renderer]
}

fn default_tier_attempts() -> u32 {
    1
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_crawl_concurrency() -> usize {
    10
}

fn default_image_cap() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
            plain_timeout_ms: default_plain_timeout_ms(),
            proxy_render_url: default_proxy_render_url(),
            proxy_render_wait_secs: default_proxy_render_wait_secs(),
            proxy_render_timeout_secs: default_proxy_render_timeout_secs(),
            proxy_render_http_timeout_ms: default_proxy_render_http_timeout_ms(),
            render_enabled: true,
            render_timeout_ms: default_render_timeout_ms(),
            render_settle_ms: default_render_settle_ms(),
            render_pool_size: default_render_pool_size(),
            upstream_proxy: None,
            fetch_mode: FetchMode::default(),
            race_strategies: default_race_strategies(),
            race_deadline_ms: default_race_deadline_ms(),
            tiers: default_tiers(),
            tier_attempts: default_tier_attempts(),
            self_heal: true,
            cache_ttl_secs: default_cache_ttl_secs(),
            crawl_mode: CrawlMode::default(),
            crawl_concurrency: default_crawl_concurrency(),
            max_links: None,
            max_link_extract_ms: None,
            image_cap: default_image_cap(),
            image_policy: ImagePolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn plain_timeout(&self) -> Duration {
        Duration::from_millis(self.plain_timeout_ms)
    }

    pub fn proxy_render_http_timeout(&self) -> Duration {
        Duration::from_millis(self.proxy_render_http_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    pub fn race_deadline(&self) -> Duration {
        Duration::from_millis(self.race_deadline_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn max_link_extract(&self) -> Option<Duration> {
        self.max_link_extract_ms.map(Duration::from_millis)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WEBRACE_`
    /// 2. TOML file from `WEBRACE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WEBRACE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WEBRACE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.user_agents.len(), 3);
        assert_eq!(config.plain_timeout_ms, 10_000);
        assert_eq!(config.proxy_render_url, "http://localhost:8050/render.html");
        assert_eq!(config.proxy_render_wait_secs, 2);
        assert_eq!(config.proxy_render_timeout_secs, 10);
        assert_eq!(config.render_timeout_ms, 15_000);
        assert_eq!(config.race_deadline_ms, 12_000);
        assert_eq!(config.fetch_mode, FetchMode::Race);
        assert_eq!(config.race_strategies, vec![StrategyKind::ProxyRender, StrategyKind::Plain]);
        assert_eq!(config.tier_attempts, 1);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.crawl_concurrency, 10);
        assert_eq!(config.image_cap, 5);
        assert!(config.self_heal);
        assert!(config.upstream_proxy.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.plain_timeout(), Duration::from_secs(10));
        assert_eq!(config.race_deadline(), Duration::from_secs(12));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.render_settle(), Duration::from_secs(1));
        assert!(config.max_link_extract().is_none());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                fetch_mode = "tiered"
                tiers = ["plain", "renderer"]
                image_policy = "last"
                max_links = 25
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.fetch_mode, FetchMode::Tiered);
        assert_eq!(config.tiers, vec![StrategyKind::Plain, StrategyKind::Renderer]);
        assert_eq!(config.image_policy, ImagePolicy::Last);
        assert_eq!(config.max_links, Some(25));
        assert_eq!(config.cache_ttl_secs, 60);
    }
}
