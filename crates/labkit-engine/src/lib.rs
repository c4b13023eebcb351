//! labkit Engine - Step verification for guided labs
//!
//! Turns raw bench events into progress through a [`labkit_model::Procedure`]
//! and scores the quiz that follows:
//! 1. **Classify**: [`RawEvent`] to [`Action`]
//! 2. **Match**: [`Action`] against the current step's criteria
//! 3. **Run**: [`ProcedureRunner`] advances on acceptance, never on rejection
//! 4. **Assess**: [`AssessmentAttempt`] records one answer per question
//!
//! [`LabSession`] wires the stages together with a [`NarrationSink`] and a
//! [`Journal`]. Everything is synchronous and single-threaded.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use labkit_engine::prelude::*;
//!
//! let document = LabDocument::builtin()?;
//! let mut session = LabSession::from_document(
//!     &document,
//!     "iron-hcl",
//!     EngineConfig::default(),
//!     NarrationBuffer::new(),
//! )?;
//! session.start();
//! session.handle_event(&RawEvent::ToolClicked { tool_id: "test_tube".into() })?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod action;
pub mod assessment;
pub mod config;
pub mod error;
pub mod journal;
pub mod matcher;
pub mod narration;
pub mod runner;
pub mod scoring;
pub mod session;

// Test harness
pub mod test_harness;

pub use action::{classify, Action, RawEvent};
pub use assessment::{AnswerFeedback, AssessmentAttempt, AssessmentResult};
pub use config::{EngineConfig, NarrationConfig, RewardConfig, ScoringConfig};
pub use error::{ContractViolation, EngineError};
pub use journal::{EntryOutcome, Journal, JournalEntry, SessionId};
pub use matcher::{match_step, Effects, MatchResult, StepMatcher};
pub use narration::{NarrationBuffer, NarrationSink, TracingNarration};
pub use runner::{ProcedureRunner, Progress, RunPhase, SubmitOutcome};
pub use scoring::{
    AnswerContext, FlatScoring, PointsLedger, ScoringStrategy, StrategyRegistry,
    TimedStreakScoring,
};
pub use session::{LabSession, XpAward};

/// Common imports for hosts embedding the engine
pub mod prelude {
    pub use crate::{
        Action, AnswerFeedback, EngineConfig, EngineError, LabSession, MatchResult,
        NarrationBuffer, NarrationSink, RawEvent, SubmitOutcome, TracingNarration, XpAward,
    };
    pub use labkit_model::{Assessment, LabDocument, Procedure, Question, Step};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
