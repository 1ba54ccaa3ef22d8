//! Composition of fetch strategies.
//!
//! ### Modes
//! - **Race**: every strategy in the race set runs concurrently; the first
//!   non-empty result wins and the others are aborted. A global deadline caps
//!   the whole race.
//! - **Tiered**: strategies run one at a time in priority order, each under
//!   its own timeout, until one returns content.
//! - **Browser**: the renderer alone.
//!
//! ### Self-heal
//! When the chosen mode yields HTML with no usable text (or nothing at all),
//! and the renderer did not already produce or attempt it, the renderer is
//! invoked exactly once more.
//!
//! ```text
//! NotStarted -> Attempting -> Succeeded(html) | Exhausted
//! Exhausted | unusable -> SelfHealAttempt -> Succeeded(html) | Empty
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::task::JoinSet;
use tokio::time::Instant;
use webrace_core::{AppConfig, FetchMode, StrategyKind};

use super::FetchStrategy;
use crate::extract::ParsedPage;

/// Outcome of one orchestrated fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Retrieved HTML; empty when every attempt failed.
    pub html: String,
    /// Strategy that produced `html`, if any.
    pub strategy_used: Option<StrategyKind>,
    /// Wall-clock time spent, self-heal included.
    pub elapsed: Duration,
    /// Whether the self-heal retry ran.
    pub self_healed: bool,
}

impl FetchResult {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// How strategies are composed.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub mode: FetchMode,
    pub race: Vec<StrategyKind>,
    pub race_deadline: Duration,
    pub tiers: Vec<StrategyKind>,
    /// Attempts per tier; 1 moves on unconditionally.
    pub tier_attempts: u32,
    pub self_heal: bool,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl FetchPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: config.fetch_mode,
            race: config.race_strategies.clone(),
            race_deadline: config.race_deadline(),
            tiers: config.tiers.clone(),
            tier_attempts: config.tier_attempts.max(1),
            self_heal: config.self_heal,
        }
    }
}

enum Outcome {
    Succeeded { html: String, strategy: StrategyKind },
    Exhausted,
}

struct Attempt {
    outcome: Outcome,
    /// The renderer was launched during this attempt.
    renderer_tried: bool,
}

/// Races or chains strategies under a [`FetchPolicy`].
#[derive(Clone)]
pub struct FetchOrchestrator {
    strategies: Arc<HashMap<StrategyKind, Arc<dyn FetchStrategy>>>,
    policy: FetchPolicy,
}

impl FetchOrchestrator {
    /// Build an orchestrator over the available strategies.
    ///
    /// Policy entries naming a strategy that is not provided are skipped.
    pub fn new(strategies: Vec<Arc<dyn FetchStrategy>>, policy: FetchPolicy) -> Self {
        let strategies = strategies.into_iter().map(|s| (s.kind(), s)).collect();
        Self { strategies: Arc::new(strategies), policy }
    }

    /// Same strategies, different composition mode.
    pub fn with_mode(&self, mode: FetchMode) -> Self {
        Self { strategies: Arc::clone(&self.strategies), policy: FetchPolicy { mode, ..self.policy.clone() } }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    pub fn has_strategy(&self, kind: StrategyKind) -> bool {
        self.strategies.contains_key(&kind)
    }

    /// Fetch `url` according to the policy, including the self-heal retry.
    ///
    /// Never fails; an empty `html` means nothing could be retrieved.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let start = Instant::now();

        let attempt = match self.policy.mode {
            FetchMode::Race => self.race(url).await,
            FetchMode::Tiered => self.tiered(url).await,
            FetchMode::Browser => self.chain(url, &[StrategyKind::Renderer], 1).await,
        };

        let (mut html, mut strategy_used) = match attempt.outcome {
            Outcome::Succeeded { html, strategy } => (html, Some(strategy)),
            Outcome::Exhausted => (String::new(), None),
        };

        let mut self_healed = false;
        if self.should_self_heal(&html, strategy_used, attempt.renderer_tried)
            && let Some(renderer) = self.strategies.get(&StrategyKind::Renderer)
        {
            tracing::info!(url = %url, previous = ?strategy_used, "content unusable, retrying with renderer");
            self_healed = true;
            let healed = fetch_within(renderer.as_ref(), url).await;
            if !healed.trim().is_empty() {
                html = healed;
                strategy_used = Some(StrategyKind::Renderer);
            }
        }

        let elapsed = start.elapsed();
        match strategy_used {
            Some(strategy) => tracing::debug!("fetched {} via {} in {}ms", url, strategy, elapsed.as_millis()),
            None => tracing::warn!(url = %url, "all fetch strategies exhausted"),
        }

        FetchResult { html, strategy_used, elapsed, self_healed }
    }

    fn should_self_heal(&self, html: &str, strategy_used: Option<StrategyKind>, renderer_tried: bool) -> bool {
        if !self.policy.self_heal || !self.has_strategy(StrategyKind::Renderer) {
            return false;
        }
        match strategy_used {
            Some(StrategyKind::Renderer) => false,
            Some(_) => ParsedPage::parse(html).is_unusable(),
            None => !renderer_tried,
        }
    }

    async fn race(&self, url: &Url) -> Attempt {
        let deadline = Instant::now() + self.policy.race_deadline;
        let mut renderer_tried = false;
        let mut set = JoinSet::new();

        for kind in &self.policy.race {
            let Some(strategy) = self.strategies.get(kind) else {
                tracing::debug!("strategy {} not available, left out of race", kind);
                continue;
            };
            renderer_tried |= *kind == StrategyKind::Renderer;

            let strategy = Arc::clone(strategy);
            let url = url.clone();
            set.spawn(async move {
                let html = fetch_within(strategy.as_ref(), &url).await;
                (strategy.kind(), html)
            });
        }

        let outcome = loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((kind, html)))) if !html.trim().is_empty() => {
                    break Outcome::Succeeded { html, strategy: kind };
                }
                Ok(Some(Ok((kind, _)))) => tracing::debug!("{} came back empty for {}", kind, url),
                Ok(Some(Err(e))) => tracing::warn!(url = %url, "strategy task failed: {e}"),
                Ok(None) => break Outcome::Exhausted,
                Err(_) => {
                    tracing::warn!(url = %url, "race deadline of {}ms elapsed", self.policy.race_deadline.as_millis());
                    break Outcome::Exhausted;
                }
            }
        };

        set.abort_all();

        Attempt { outcome, renderer_tried }
    }

    async fn tiered(&self, url: &Url) -> Attempt {
        self.chain(url, &self.policy.tiers, self.policy.tier_attempts).await
    }

    async fn chain(&self, url: &Url, order: &[StrategyKind], attempts: u32) -> Attempt {
        let mut renderer_tried = false;

        for kind in order {
            let Some(strategy) = self.strategies.get(kind) else {
                tracing::debug!("strategy {} not available, skipping tier", kind);
                continue;
            };
            renderer_tried |= *kind == StrategyKind::Renderer;

            for attempt in 1..=attempts.max(1) {
                let html = fetch_within(strategy.as_ref(), url).await;
                if !html.trim().is_empty() {
                    return Attempt { outcome: Outcome::Succeeded { html, strategy: *kind }, renderer_tried };
                }
                tracing::debug!("tier {} attempt {} came back empty for {}", kind, attempt, url);
            }
        }

        Attempt { outcome: Outcome::Exhausted, renderer_tried }
    }
}

/// Run one strategy under its own timeout, treating expiry as empty.
async fn fetch_within(strategy: &dyn FetchStrategy, url: &Url) -> String {
    match tokio::time::timeout(strategy.timeout(), strategy.fetch(url)).await {
        Ok(html) => html,
        Err(_) => {
            tracing::warn!(strategy = %strategy.kind(), url = %url, "timed out after {}ms", strategy.timeout().as_millis());
            String::new()
        }
    }
}
