//! Step matcher
//!
//! Compares an [`Action`] with the criteria of the current [`Step`]. When
//! there is no current step (free-play, or the procedure already finished)
//! every action is accepted with no effects.

use crate::action::Action;
use labkit_model::{Criteria, Step};
use serde::{Deserialize, Serialize};

/// Default prefix for retry narration
pub const DEFAULT_RETRY_PREFIX: &str = "Not quite. ";

/// Effects the UI applies after an accepted action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    /// Animation tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_effect: Option<String>,
    /// New vessel state label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resulting_state_tag: Option<String>,
}

impl Effects {
    /// No effects
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Effects declared by `step`
    #[must_use]
    pub fn of(step: &Step) -> Self {
        Self {
            visual_effect: step.visual_effect.clone(),
            resulting_state_tag: step.resulting_state_tag.clone(),
        }
    }

    /// Whether nothing changes visually
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visual_effect.is_none() && self.resulting_state_tag.is_none()
    }
}

/// Outcome of matching one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchResult {
    /// The action satisfies the step
    Accepted {
        /// Effects to apply
        effects: Effects,
    },
    /// The action does not satisfy the step; state is unchanged
    Rejected {
        /// Guidance re-stating the current prompt
        retry_narration: String,
    },
}

impl MatchResult {
    /// Whether the action was accepted
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Matcher with configurable retry wording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatcher {
    retry_prefix: String,
}

impl Default for StepMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_PREFIX)
    }
}

impl StepMatcher {
    /// Create a matcher that prefixes retry narration with `retry_prefix`
    #[must_use]
    pub fn new(retry_prefix: impl Into<String>) -> Self {
        Self {
            retry_prefix: retry_prefix.into(),
        }
    }

    /// Match `action` against `step`
    #[must_use]
    pub fn matches(&self, action: &Action, step: Option<&Step>) -> MatchResult {
        let Some(step) = step else {
            return MatchResult::Accepted {
                effects: Effects::none(),
            };
        };

        if satisfies(&step.criteria, action) {
            MatchResult::Accepted {
                effects: Effects::of(step),
            }
        } else {
            MatchResult::Rejected {
                retry_narration: format!("{}{}", self.retry_prefix, step.prompt),
            }
        }
    }
}

/// Match with the default retry wording
#[must_use]
pub fn match_step(action: &Action, step: Option<&Step>) -> MatchResult {
    StepMatcher::default().matches(action, step)
}

fn satisfies(criteria: &Criteria, action: &Action) -> bool {
    match (criteria, action) {
        (Criteria::SelectTool { tool_id: expected }, Action::SelectTool { tool_id }) => {
            expected == tool_id
        }
        (Criteria::AddResource { resource_id: expected }, Action::AddResource { resource_id }) => {
            expected == resource_id
        }
        (Criteria::Observe, Action::Observe) | (Criteria::ApplyHeat, Action::ApplyHeat) => true,
        (
            Criteria::SelectTool { .. }
            | Criteria::AddResource { .. }
            | Criteria::Observe
            | Criteria::ApplyHeat,
            _,
        ) => false,
    }
}
