//! Pluggable quiz scoring
//!
//! The assessment engine only counts correct answers. Points, time bonuses
//! and streaks are presentation concerns layered on top through a
//! [`ScoringStrategy`], selected by name from a [`StrategyRegistry`].

use crate::config::ScoringConfig;
use crate::error::EngineError;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Everything a strategy may look at for one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerContext {
    /// Whether the answer was correct
    pub correct: bool,
    /// Time taken to answer
    pub elapsed: Duration,
    /// Consecutive correct answers including this one (0 if wrong)
    pub streak: u32,
}

/// Points awarded per answer
pub trait ScoringStrategy: fmt::Debug {
    /// Points for one answer
    fn points(&self, ctx: &AnswerContext) -> u32;

    /// Strategy name (for config and logs)
    fn name(&self) -> &'static str;
}

/// Fixed points per correct answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatScoring {
    /// Points for a correct answer
    pub points_per_correct: u32,
}

impl ScoringStrategy for FlatScoring {
    fn points(&self, ctx: &AnswerContext) -> u32 {
        if ctx.correct {
            self.points_per_correct
        } else {
            0
        }
    }

    fn name(&self) -> &'static str {
        "flat"
    }
}

/// Base points plus a bonus for speed and for streaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedStreakScoring {
    /// Points for any correct answer
    pub base: u32,
    /// Seconds after which no time bonus is given
    pub time_limit: Duration,
    /// Bonus per whole second left on the clock
    pub bonus_per_second: u32,
    /// Bonus per streak answer beyond the first
    pub streak_bonus: u32,
}

impl Default for TimedStreakScoring {
    fn default() -> Self {
        Self {
            base: 100,
            time_limit: Duration::from_secs(30),
            bonus_per_second: 5,
            streak_bonus: 50,
        }
    }
}

impl ScoringStrategy for TimedStreakScoring {
    fn points(&self, ctx: &AnswerContext) -> u32 {
        if !ctx.correct {
            return 0;
        }
        let remaining = self.time_limit.saturating_sub(ctx.elapsed).as_secs();
        let time_bonus = u32::try_from(remaining)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.bonus_per_second);
        let streak_bonus = self
            .streak_bonus
            .saturating_mul(ctx.streak.saturating_sub(1));
        self.base
            .saturating_add(time_bonus)
            .saturating_add(streak_bonus)
    }

    fn name(&self) -> &'static str {
        "timed_streak"
    }
}

type StrategyCtor = fn(&ScoringConfig) -> Box<dyn ScoringStrategy>;

/// Registry of strategy constructors by name
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyCtor>,
}

impl StrategyRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in strategies
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("flat", |config| {
            Box::new(FlatScoring {
                points_per_correct: config.points_per_correct,
            })
        });
        registry.register("timed_streak", |config| {
            Box::new(TimedStreakScoring {
                base: config.base_points,
                time_limit: Duration::from_secs(config.time_limit_secs),
                bonus_per_second: config.bonus_per_second,
                streak_bonus: config.streak_bonus,
            })
        });
        registry
    }

    /// Register a strategy constructor
    pub fn register(&mut self, name: &str, ctor: StrategyCtor) {
        self.strategies.insert(name.to_string(), ctor);
    }

    /// Check if a strategy exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Build the strategy named in `config`
    ///
    /// # Errors
    /// [`EngineError::UnknownStrategy`] if the name is not registered.
    pub fn resolve(&self, config: &ScoringConfig) -> Result<Box<dyn ScoringStrategy>, EngineError> {
        self.strategies
            .get(&config.strategy)
            .map(|ctor| ctor(config))
            .ok_or_else(|| EngineError::UnknownStrategy(config.strategy.clone()))
    }
}

/// Running points total for one assessment attempt
#[derive(Debug)]
pub struct PointsLedger {
    strategy: Box<dyn ScoringStrategy>,
    total: u32,
    streak: u32,
    best_streak: u32,
}

impl PointsLedger {
    /// Create a ledger using `strategy`
    #[must_use]
    pub fn new(strategy: Box<dyn ScoringStrategy>) -> Self {
        Self {
            strategy,
            total: 0,
            streak: 0,
            best_streak: 0,
        }
    }

    /// Record an answer and return the points it earned
    pub fn record(&mut self, correct: bool, elapsed: Duration) -> u32 {
        self.streak = if correct { self.streak + 1 } else { 0 };
        self.best_streak = self.best_streak.max(self.streak);
        let points = self.strategy.points(&AnswerContext {
            correct,
            elapsed,
            streak: self.streak,
        });
        self.total = self.total.saturating_add(points);
        points
    }

    /// Reset totals and streaks
    pub fn reset(&mut self) {
        self.total = 0;
        self.streak = 0;
        self.best_streak = 0;
    }

    /// Points so far
    #[inline]
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Current streak
    #[inline]
    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Longest streak so far
    #[inline]
    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Name of the strategy in use
    #[inline]
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}
