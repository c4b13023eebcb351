//! Lab session
//!
//! Glues the pipeline together for one learner at one bench:
//!
//! ```text
//! RawEvent -> classify -> ProcedureRunner::submit -> NarrationSink
//!                                   |                   Journal
//!                                   +-- on completion --> AssessmentAttempt -> PointsLedger
//! ```
//!
//! A session without a procedure is free-play: every supported action is
//! accepted and only journaled.

use crate::action::{classify, Action, RawEvent};
use crate::assessment::{AnswerFeedback, AssessmentAttempt};
use crate::config::EngineConfig;
use crate::error::{violation, ContractViolation, EngineError};
use crate::journal::{EntryOutcome, Journal, SessionId};
use crate::matcher::{match_step, MatchResult};
use crate::narration::NarrationSink;
use crate::runner::{ProcedureRunner, SubmitOutcome};
use crate::scoring::{PointsLedger, StrategyRegistry};
use labkit_model::{Assessment, LabDocument, Procedure};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Experience earned by a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    /// XP for completing the procedure
    pub completion_xp: u32,
    /// XP for correct quiz answers
    pub assessment_xp: u32,
    /// Quiz points from the scoring strategy
    pub points: u32,
    /// Correct answers
    pub score: usize,
    /// Questions asked
    pub total: usize,
}

impl XpAward {
    /// Completion plus assessment XP
    #[inline]
    #[must_use]
    pub fn total_xp(&self) -> u32 {
        self.completion_xp.saturating_add(self.assessment_xp)
    }
}

/// One learner session, guided or free-play
#[derive(Debug)]
pub struct LabSession<S: NarrationSink> {
    id: SessionId,
    config: EngineConfig,
    runner: Option<ProcedureRunner>,
    assessment: Option<Assessment>,
    attempt: Option<AssessmentAttempt>,
    ledger: Option<PointsLedger>,
    journal: Journal,
    sink: S,
}

impl<S: NarrationSink> LabSession<S> {
    /// Guided session for `procedure`, followed by `assessment` if given
    ///
    /// # Errors
    /// [`EngineError::Config`] if the assessment belongs to another
    /// procedure, [`EngineError::UnknownStrategy`] if the configured scoring
    /// strategy is not registered.
    pub fn guided(
        procedure: Procedure,
        assessment: Option<Assessment>,
        config: EngineConfig,
        sink: S,
    ) -> Result<Self, EngineError> {
        if let Some(assessment) = &assessment {
            if assessment.procedure_id() != procedure.id() {
                return Err(EngineError::Config(format!(
                    "assessment for '{}' attached to procedure '{}'",
                    assessment.procedure_id(),
                    procedure.id()
                )));
            }
        }
        let strategy = StrategyRegistry::with_defaults().resolve(&config.scoring)?;
        let id = SessionId::new();
        tracing::debug!(
            session = %id,
            procedure = %procedure.id(),
            strategy = strategy.name(),
            "Guided session created"
        );

        Ok(Self {
            id,
            runner: Some(ProcedureRunner::with_config(procedure, &config)),
            assessment,
            attempt: None,
            ledger: Some(PointsLedger::new(strategy)),
            journal: Journal::new(id),
            config,
            sink,
        })
    }

    /// Guided session for procedure `procedure_id` of `document`
    ///
    /// # Errors
    /// [`EngineError::NoProcedure`] if the document has no such procedure,
    /// plus the errors of [`LabSession::guided`].
    pub fn from_document(
        document: &LabDocument,
        procedure_id: &str,
        config: EngineConfig,
        sink: S,
    ) -> Result<Self, EngineError> {
        let procedure = document
            .procedure(procedure_id)
            .ok_or_else(|| EngineError::NoProcedure(procedure_id.to_string()))?
            .clone();
        let assessment = document.assessment(procedure_id).cloned();
        Self::guided(procedure, assessment, config, sink)
    }

    /// Free-play session with no procedure
    #[must_use]
    pub fn free_play(config: EngineConfig, sink: S) -> Self {
        let id = SessionId::new();
        tracing::debug!(session = %id, "Free-play session created");
        Self {
            id,
            config,
            runner: None,
            assessment: None,
            attempt: None,
            ledger: None,
            journal: Journal::new(id),
            sink,
        }
    }

    /// Start (or restart) the procedure and narrate its first step
    ///
    /// Returns the narrated line, `None` in free-play.
    pub fn start(&mut self) -> Option<String> {
        let runner = self.runner.as_mut()?;
        let line = runner.start();
        self.attempt = None;
        if let Some(ledger) = self.ledger.as_mut() {
            ledger.reset();
        }
        self.sink.narrate(&line);
        Some(line)
    }

    /// Handle a raw bench event
    ///
    /// Unsupported events are a contract violation: ignored with `Ok(None)`,
    /// or an error when `strict_contracts` is set.
    ///
    /// # Errors
    /// [`EngineError::Contract`] for unsupported events in strict mode.
    pub fn handle_event(&mut self, event: &RawEvent) -> Result<Option<SubmitOutcome>, EngineError> {
        let action = if event.is_supported() { classify(event) } else { None };
        match action {
            Some(action) => Ok(Some(self.submit(&action))),
            None => self.contract(ContractViolation::UnsupportedEvent(format!("{event:?}"))),
        }
    }

    /// Submit an already classified action
    pub fn submit(&mut self, action: &Action) -> SubmitOutcome {
        let Some(runner) = self.runner.as_mut() else {
            self.journal
                .record(None, action.clone(), EntryOutcome::FreePlay);
            tracing::debug!(session = %self.id, %action, "Free-play action");
            return SubmitOutcome {
                result: match_step(action, None),
                narration: Vec::new(),
                step_index: None,
                is_complete: false,
            };
        };

        let was_complete = runner.is_complete();
        let outcome = runner.submit(action);

        let entry = match &outcome.result {
            MatchResult::Accepted { .. } => EntryOutcome::Accepted,
            MatchResult::Rejected { retry_narration } => EntryOutcome::Rejected {
                retry_narration: retry_narration.clone(),
            },
        };
        self.journal.record(outcome.step_index, action.clone(), entry);

        for line in &outcome.narration {
            self.sink.narrate(line);
        }

        if outcome.is_complete && !was_complete {
            match self.assessment.clone() {
                Some(assessment) => self.attempt = Some(AssessmentAttempt::start(assessment)),
                None => self.announce_award(),
            }
        }
        outcome
    }

    /// Answer quiz question `question` with `option`
    ///
    /// # Errors
    /// See [`LabSession::answer_timed`].
    pub fn answer(
        &mut self,
        question: usize,
        option: usize,
    ) -> Result<Option<AnswerFeedback>, EngineError> {
        self.answer_timed(question, option, Duration::ZERO)
    }

    /// Answer a quiz question, recording how long the learner took
    ///
    /// Contract violations leave the attempt unchanged and yield `Ok(None)`
    /// unless `strict_contracts` is set.
    ///
    /// # Errors
    /// [`EngineError::NoAssessment`] if no quiz is running,
    /// [`EngineError::Contract`] for violations in strict mode.
    pub fn answer_timed(
        &mut self,
        question: usize,
        option: usize,
        elapsed: Duration,
    ) -> Result<Option<AnswerFeedback>, EngineError> {
        let attempt = self.attempt.as_mut().ok_or(EngineError::NoAssessment)?;
        match attempt.answer(question, option) {
            Ok(feedback) => {
                if let Some(ledger) = self.ledger.as_mut() {
                    ledger.record(feedback.correct, elapsed);
                }
                if feedback.finished {
                    self.announce_award();
                }
                Ok(Some(feedback))
            }
            Err(v) => self.contract(v),
        }
    }

    /// Experience earned, once everything the session asks for is done
    ///
    /// `None` in free-play, before completion, or while the quiz is still
    /// open.
    #[must_use]
    pub fn award(&self) -> Option<XpAward> {
        let runner = self.runner.as_ref()?;
        if !runner.is_complete() {
            return None;
        }
        let rewards = self.config.rewards;
        let (score, total) = match (&self.assessment, &self.attempt) {
            (None, _) => (0, 0),
            (Some(_), Some(attempt)) if attempt.is_finished() => {
                (attempt.score(), attempt.assessment().question_count())
            }
            (Some(_), _) => return None,
        };
        let award = XpAward {
            completion_xp: rewards.completion_xp,
            assessment_xp: rewards
                .per_correct_xp
                .saturating_mul(u32::try_from(score).unwrap_or(u32::MAX)),
            points: self.ledger.as_ref().map_or(0, PointsLedger::total),
            score,
            total,
        };
        Some(award)
    }

    fn announce_award(&self) {
        if let Some(award) = self.award() {
            tracing::info!(
                session = %self.id,
                xp = award.total_xp(),
                points = award.points,
                "Session awarded"
            );
        }
    }

    /// Discard run and quiz state; the journal is kept
    pub fn abandon(&mut self) {
        if let Some(runner) = self.runner.as_mut() {
            runner.abandon();
        }
        self.attempt = None;
        if let Some(ledger) = self.ledger.as_mut() {
            ledger.reset();
        }
    }

    fn contract<T>(&self, v: ContractViolation) -> Result<Option<T>, EngineError> {
        let v = violation(v);
        if self.config.strict_contracts {
            Err(v.into())
        } else {
            Ok(None)
        }
    }

    /// Session id
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Effective configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the session has no procedure
    #[inline]
    #[must_use]
    pub fn is_free_play(&self) -> bool {
        self.runner.is_none()
    }

    /// Procedure run state, `None` in free-play
    #[inline]
    #[must_use]
    pub fn runner(&self) -> Option<&ProcedureRunner> {
        self.runner.as_ref()
    }

    /// The quiz, once the procedure completed
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> Option<&AssessmentAttempt> {
        self.attempt.as_ref()
    }

    /// Quiz points so far
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> Option<&PointsLedger> {
        self.ledger.as_ref()
    }

    /// Every handled action
    #[inline]
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Narration sink
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable narration sink
    #[inline]
    #[must_use]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the session and return its sink
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }
}
