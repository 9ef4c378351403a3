//! Research loop configuration.
//!
//! Defaults reproduce the behaviour of the hosted deep-research tool: seven
//! iterations, a four and a half minute budget, three failed searches before
//! giving up.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// How the keyword fallback decides whether to keep researching when the
/// reasoning output could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackContinuation {
    /// Continue only if the current topic differs from the root topic.
    #[default]
    UnlessRootTopic,
    /// Always continue with the keyword-derived topic.
    Always,
    /// Never continue past a parse failure.
    Never,
}

impl FallbackContinuation {
    /// Apply the policy to the topic that was just analyzed.
    pub fn should_continue(&self, current_topic: &str, root_topic: &str) -> bool {
        match self {
            Self::UnlessRootTopic => current_topic != root_topic,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Configuration for a [`DeepResearch`](crate::DeepResearch) engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Iteration cap used when a request does not specify one (default: 7)
    pub default_max_depth: u32,
    /// Wall-clock budget for a whole session in milliseconds
    pub time_limit_ms: u64,
    /// Failed searches tolerated before aborting to synthesis
    pub max_failed_attempts: u32,
    /// Upper bound of the minimum-iteration floor
    pub minimum_iterations_cap: u32,
    /// Progress steps expected per depth (search, extract, analyze, ...)
    pub steps_per_depth: u32,
    /// Results requested from the search provider per query
    pub results_per_search: usize,
    /// Most recent findings shown to the planner
    pub analysis_window: usize,
    /// Characters of each finding shown to the planner
    pub analysis_excerpt_chars: usize,
    /// Remaining budget required before the minimum-iteration floor is enforced
    pub min_time_for_forced_continue_ms: u64,
    /// Run an intermediate synthesis every N depths
    pub intermediate_synthesis_interval: u32,
    /// Intermediate synthesis only runs above this many findings
    pub intermediate_synthesis_min_findings: usize,
    /// Policy applied when the planner output cannot be parsed
    pub fallback_continuation: FallbackContinuation,
    /// Fetch the `urlToSearch` proposed by the planner in the next iteration
    pub follow_urls: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 7,
            time_limit_ms: 270_000,
            max_failed_attempts: 3,
            minimum_iterations_cap: 3,
            steps_per_depth: 5,
            results_per_search: 5,
            analysis_window: 5,
            analysis_excerpt_chars: 3000,
            min_time_for_forced_continue_ms: 60_000,
            intermediate_synthesis_interval: 3,
            intermediate_synthesis_min_findings: 10,
            fallback_continuation: FallbackContinuation::default(),
            follow_urls: false,
        }
    }
}

impl ResearchConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with overrides from `RESEARCH_*` environment variables.
    ///
    /// Unparseable values are rejected rather than ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_parse::<u32>("RESEARCH_MAX_DEPTH")? {
            config.default_max_depth = v;
        }
        if let Some(v) = env_parse::<u64>("RESEARCH_TIME_LIMIT_MS")? {
            config.time_limit_ms = v;
        }
        if let Some(v) = env_parse::<u32>("RESEARCH_MAX_FAILED_ATTEMPTS")? {
            config.max_failed_attempts = v;
        }
        if let Some(v) = env_parse::<bool>("RESEARCH_FOLLOW_URLS")? {
            config.follow_urls = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_default_max_depth(mut self, depth: u32) -> Self {
        self.default_max_depth = depth;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = limit.as_millis() as u64;
        self
    }

    pub fn with_max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    pub fn with_fallback_continuation(mut self, policy: FallbackContinuation) -> Self {
        self.fallback_continuation = policy;
        self
    }

    pub fn with_follow_urls(mut self, follow: bool) -> Self {
        self.follow_urls = follow;
        self
    }

    /// Session time budget.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    /// Budget that must remain for the minimum-iteration floor to apply.
    pub fn min_time_for_forced_continue(&self) -> Duration {
        Duration::from_millis(self.min_time_for_forced_continue_ms)
    }

    /// Check the configuration for values the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.default_max_depth == 0 {
            return Err(Error::config("default_max_depth must be at least 1"));
        }
        if self.max_failed_attempts == 0 {
            return Err(Error::config("max_failed_attempts must be at least 1"));
        }
        if self.results_per_search == 0 {
            return Err(Error::config("results_per_search must be at least 1"));
        }
        if self.intermediate_synthesis_interval == 0 {
            return Err(Error::config(
                "intermediate_synthesis_interval must be at least 1",
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(format!("invalid value for {}: {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}
