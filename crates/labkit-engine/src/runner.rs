//! Procedure runner
//!
//! Owns the mutable state of one attempt at a procedure and exposes a single
//! mutation entry point, [`ProcedureRunner::submit`].
//!
//! ```text
//! NotStarted --start--> Running(0) --accept--> Running(1) ... --accept last--> Complete
//!                         ^    |
//!                         +----+ reject (no state change)
//! ```
//!
//! Narration is returned as data; the runner never talks to a speech or
//! display layer itself.

use crate::action::Action;
use crate::config::EngineConfig;
use crate::matcher::{Effects, MatchResult, StepMatcher};
use labkit_model::{Procedure, ResourceId, Step, ToolId};
use serde::{Deserialize, Serialize};

/// Default line narrated when the last step is satisfied
pub const DEFAULT_COMPLETION_NARRATION: &str = "Procedure complete! Time for a quick check.";

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase {
    /// Created but not started
    NotStarted,
    /// Waiting for the action that satisfies `step_index`
    Running {
        /// Current step
        step_index: usize,
    },
    /// Final step satisfied
    Complete,
}

impl RunPhase {
    /// Whether moving to `next` is a legal transition
    #[must_use]
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        match (self, next) {
            // start / restart
            (_, RunPhase::Running { step_index: 0 }) | (_, RunPhase::NotStarted) => true,
            (RunPhase::Running { step_index: from }, RunPhase::Running { step_index: to }) => {
                to == from + 1
            }
            (RunPhase::Running { .. }, RunPhase::Complete) => true,
            _ => false,
        }
    }
}

/// How far a run has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Satisfied steps
    pub completed: usize,
    /// Total steps
    pub total: usize,
}

impl Progress {
    /// Completion in whole percent
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}

/// Result of submitting one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Matcher verdict
    pub result: MatchResult,
    /// Lines to narrate, in order
    pub narration: Vec<String>,
    /// Step the action was matched against, `None` outside a guided run
    pub step_index: Option<usize>,
    /// Whether the procedure is complete after this action
    pub is_complete: bool,
}

/// Run state for one attempt at a procedure
#[derive(Debug, Clone)]
pub struct ProcedureRunner {
    procedure: Procedure,
    matcher: StepMatcher,
    completion_narration: String,
    phase: RunPhase,
    resource_log: Vec<ResourceId>,
    selected_tool: Option<ToolId>,
    state_tag: Option<String>,
}

impl ProcedureRunner {
    /// Create a runner with default wording
    #[must_use]
    pub fn new(procedure: Procedure) -> Self {
        Self {
            procedure,
            matcher: StepMatcher::default(),
            completion_narration: DEFAULT_COMPLETION_NARRATION.to_string(),
            phase: RunPhase::NotStarted,
            resource_log: Vec::new(),
            selected_tool: None,
            state_tag: None,
        }
    }

    /// Create a runner using the narration settings of `config`
    #[must_use]
    pub fn with_config(procedure: Procedure, config: &EngineConfig) -> Self {
        Self {
            matcher: StepMatcher::new(config.narration.retry_prefix.clone()),
            completion_narration: config.narration.completion.clone(),
            ..Self::new(procedure)
        }
    }

    /// Start (or restart) the run and return the first step's narration
    pub fn start(&mut self) -> String {
        self.resource_log.clear();
        self.selected_tool = None;
        self.state_tag = None;
        self.transition(RunPhase::Running { step_index: 0 });
        tracing::info!(procedure = %self.procedure.id(), "Procedure started");
        self.procedure
            .step(0)
            .map(|step| step.narration.clone())
            .unwrap_or_default()
    }

    /// Discard the attempt
    pub fn abandon(&mut self) {
        self.resource_log.clear();
        self.selected_tool = None;
        self.state_tag = None;
        self.transition(RunPhase::NotStarted);
        tracing::info!(procedure = %self.procedure.id(), "Procedure abandoned");
    }

    /// Submit an action
    ///
    /// Accepted actions update the resource log or tool selection and advance
    /// the run. Rejected actions change nothing and return retry narration,
    /// so repeating them is harmless. Outside `Running` every action is
    /// accepted without touching any state.
    pub fn submit(&mut self, action: &Action) -> SubmitOutcome {
        let RunPhase::Running { step_index } = self.phase else {
            tracing::debug!(%action, phase = ?self.phase, "Action outside a running procedure");
            return SubmitOutcome {
                result: self.matcher.matches(action, None),
                narration: Vec::new(),
                step_index: None,
                is_complete: self.is_complete(),
            };
        };

        let result = self.matcher.matches(action, self.procedure.step(step_index));
        let narration = match &result {
            MatchResult::Accepted { effects } => self.accept(step_index, action, effects),
            MatchResult::Rejected { retry_narration } => {
                tracing::debug!(%action, step_index, "Action rejected");
                vec![retry_narration.clone()]
            }
        };

        SubmitOutcome {
            result,
            narration,
            step_index: Some(step_index),
            is_complete: self.is_complete(),
        }
    }

    fn accept(&mut self, step_index: usize, action: &Action, effects: &Effects) -> Vec<String> {
        match action {
            Action::AddResource { resource_id } => self.resource_log.push(resource_id.clone()),
            Action::SelectTool { tool_id } => self.selected_tool = Some(tool_id.clone()),
            Action::Observe | Action::ApplyHeat => {}
        }
        if let Some(tag) = &effects.resulting_state_tag {
            self.state_tag = Some(tag.clone());
        }
        tracing::debug!(%action, step_index, "Action accepted");

        let next = step_index + 1;
        match self.procedure.step(next).map(|step| step.narration.clone()) {
            Some(line) => {
                self.transition(RunPhase::Running { step_index: next });
                vec![line]
            }
            None => {
                self.transition(RunPhase::Complete);
                tracing::info!(procedure = %self.procedure.id(), "Procedure complete");
                vec![self.completion_narration.clone()]
            }
        }
    }

    fn transition(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal run transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }

    /// The procedure being run
    #[inline]
    #[must_use]
    pub fn procedure(&self) -> &Procedure {
        &self.procedure
    }

    /// Current lifecycle phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Index of the current step while running
    #[inline]
    #[must_use]
    pub fn current_step_index(&self) -> Option<usize> {
        match self.phase {
            RunPhase::Running { step_index } => Some(step_index),
            RunPhase::NotStarted | RunPhase::Complete => None,
        }
    }

    /// The step awaiting an action
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.current_step_index()
            .and_then(|index| self.procedure.step(index))
    }

    /// Resources added so far, in order
    #[inline]
    #[must_use]
    pub fn resource_log(&self) -> &[ResourceId] {
        &self.resource_log
    }

    /// Last successfully selected tool
    #[inline]
    #[must_use]
    pub fn selected_tool(&self) -> Option<&ToolId> {
        self.selected_tool.as_ref()
    }

    /// Latest state tag applied to the vessel
    #[inline]
    #[must_use]
    pub fn current_state_tag(&self) -> Option<&str> {
        self.state_tag.as_deref()
    }

    /// Whether the final step has been satisfied
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Complete
    }

    /// Steps satisfied out of the total
    #[must_use]
    pub fn progress(&self) -> Progress {
        let total = self.procedure.step_count();
        let completed = match self.phase {
            RunPhase::NotStarted => 0,
            RunPhase::Running { step_index } => step_index,
            RunPhase::Complete => total,
        };
        Progress { completed, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labkit_model::Procedure;

    fn procedure() -> Procedure {
        Procedure::builder("iron-hcl", "Iron and Hydrochloric Acid")
            .step(Step::select_tool("Select a test tube.", "test_tube"))
            .step(Step::add_resource("Add iron.", "fe").with_state_tag("grey"))
            .step(
                Step::add_resource("Add acid.", "hcl")
                    .with_state_tag("pale-green")
                    .with_narration("Now the acid."),
            )
            .step(Step::observe("Observe."))
            .build()
            .unwrap()
    }

    #[test]
    fn start_narrates_first_step() {
        let mut runner = ProcedureRunner::new(procedure());
        assert_eq!(runner.phase(), RunPhase::NotStarted);
        assert_eq!(runner.start(), "Select a test tube.");
        assert_eq!(runner.phase(), RunPhase::Running { step_index: 0 });
    }

    #[test]
    fn accepted_action_advances_and_narrates_next() {
        let mut runner = ProcedureRunner::new(procedure());
        runner.start();
        runner.submit(&Action::select_tool("test_tube"));
        let outcome = runner.submit(&Action::add_resource("fe"));
        assert!(outcome.result.is_accepted());
        assert_eq!(outcome.narration, vec!["Now the acid.".to_string()]);
        assert_eq!(outcome.step_index, Some(1));
        assert_eq!(runner.current_step_index(), Some(2));
        assert_eq!(runner.selected_tool().map(ToolId::as_str), Some("test_tube"));
        assert_eq!(runner.current_state_tag(), Some("grey"));
    }

    #[test]
    fn last_step_completes() {
        let mut runner = ProcedureRunner::new(procedure());
        runner.start();
        for action in [
            Action::select_tool("test_tube"),
            Action::add_resource("fe"),
            Action::add_resource("hcl"),
        ] {
            assert!(!runner.submit(&action).is_complete);
        }
        let outcome = runner.submit(&Action::Observe);
        assert!(outcome.is_complete);
        assert_eq!(outcome.narration, vec![DEFAULT_COMPLETION_NARRATION.to_string()]);
        assert_eq!(runner.progress().percent(), 100);
        assert_eq!(runner.current_step(), None);
    }

    #[test]
    fn submissions_after_completion_do_not_mutate() {
        let mut runner = ProcedureRunner::new(procedure());
        runner.start();
        for action in [
            Action::select_tool("test_tube"),
            Action::add_resource("fe"),
            Action::add_resource("hcl"),
            Action::Observe,
        ] {
            runner.submit(&action);
        }
        let outcome = runner.submit(&Action::add_resource("extra"));
        assert!(outcome.result.is_accepted());
        assert_eq!(outcome.step_index, None);
        assert_eq!(runner.resource_log().len(), 2);
    }

    #[test]
    fn submit_before_start_is_inert() {
        let mut runner = ProcedureRunner::new(procedure());
        let outcome = runner.submit(&Action::add_resource("fe"));
        assert!(outcome.result.is_accepted());
        assert!(outcome.narration.is_empty());
        assert!(runner.resource_log().is_empty());
        assert_eq!(runner.phase(), RunPhase::NotStarted);
    }

    #[test]
    fn restart_clears_state() {
        let mut runner = ProcedureRunner::new(procedure());
        runner.start();
        runner.submit(&Action::select_tool("test_tube"));
        runner.submit(&Action::add_resource("fe"));
        runner.start();
        assert!(runner.resource_log().is_empty());
        assert!(runner.selected_tool().is_none());
        assert_eq!(runner.current_step_index(), Some(0));
        assert_eq!(runner.progress(), Progress { completed: 0, total: 4 });
    }

    #[test]
    fn abandon_returns_to_not_started() {
        let mut runner = ProcedureRunner::new(procedure());
        runner.start();
        runner.submit(&Action::select_tool("test_tube"));
        runner.abandon();
        assert_eq!(runner.phase(), RunPhase::NotStarted);
        assert!(runner.selected_tool().is_none());
    }

    #[test]
    fn transitions() {
        let running = |step_index| RunPhase::Running { step_index };
        assert!(RunPhase::NotStarted.can_transition_to(running(0)));
        assert!(running(0).can_transition_to(running(1)));
        assert!(!running(0).can_transition_to(running(2)));
        assert!(running(3).can_transition_to(RunPhase::Complete));
        assert!(!RunPhase::NotStarted.can_transition_to(RunPhase::Complete));
        assert!(RunPhase::Complete.can_transition_to(running(0)));
    }

    #[test]
    fn progress_percent() {
        assert_eq!(Progress { completed: 1, total: 4 }.percent(), 25);
        assert_eq!(Progress { completed: 0, total: 0 }.percent(), 0);
    }
}
