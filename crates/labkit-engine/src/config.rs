//! Engine configuration
//!
//! Every field has a default, so an empty TOML file is a valid config.

use crate::error::EngineError;
use crate::matcher::DEFAULT_RETRY_PREFIX;
use crate::runner::DEFAULT_COMPLETION_NARRATION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Narration wording
    pub narration: NarrationConfig,
    /// Quiz points
    pub scoring: ScoringConfig,
    /// Experience rewards
    pub rewards: RewardConfig,
    /// Surface contract violations as errors instead of ignoring them
    pub strict_contracts: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With scoring strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.scoring.strategy = strategy.into();
        self
    }

    /// With completion narration
    #[inline]
    #[must_use]
    pub fn with_completion_narration(mut self, line: impl Into<String>) -> Self {
        self.narration.completion = line.into();
        self
    }

    /// With retry prefix
    #[inline]
    #[must_use]
    pub fn with_retry_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.narration.retry_prefix = prefix.into();
        self
    }

    /// With strict contracts
    #[inline]
    #[must_use]
    pub fn with_strict_contracts(mut self, strict: bool) -> Self {
        self.strict_contracts = strict;
        self
    }

    /// Parse a TOML config
    ///
    /// # Errors
    /// [`EngineError::Config`] on malformed TOML or unknown value types.
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load a TOML config file
    ///
    /// # Errors
    /// [`EngineError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            strategy = %config.scoring.strategy,
            "Loaded engine config"
        );
        Ok(config)
    }
}

/// Narration wording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Line narrated when the procedure completes
    pub completion: String,
    /// Prefix of retry narration
    pub retry_prefix: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            completion: DEFAULT_COMPLETION_NARRATION.to_string(),
            retry_prefix: DEFAULT_RETRY_PREFIX.to_string(),
        }
    }
}

/// Quiz points configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Registered strategy name
    pub strategy: String,
    /// Points per correct answer (`flat`)
    pub points_per_correct: u32,
    /// Base points for a correct answer (`timed_streak`)
    pub base_points: u32,
    /// Seconds before the time bonus runs out (`timed_streak`)
    pub time_limit_secs: u64,
    /// Bonus per second left (`timed_streak`)
    pub bonus_per_second: u32,
    /// Bonus per extra streak answer (`timed_streak`)
    pub streak_bonus: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: "flat".to_string(),
            points_per_correct: 1,
            base_points: 100,
            time_limit_secs: 30,
            bonus_per_second: 5,
            streak_bonus: 50,
        }
    }
}

/// Experience rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// XP for finishing the procedure
    pub completion_xp: u32,
    /// XP per correct quiz answer
    pub per_correct_xp: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            completion_xp: 50,
            per_correct_xp: 10,
        }
    }
}
