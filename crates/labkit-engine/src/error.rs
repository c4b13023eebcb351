//! Error types for the engine
//!
//! Three classes of trouble exist and only two of them are errors:
//! - configuration errors (bad content or bad engine config), fatal to the
//!   affected run, never to the host application
//! - contract violations (double answering, unsupported events), programmer
//!   errors that are logged and ignored unless strict mode is on
//! - user mismatches (wrong action for the current step), which are a normal
//!   [`crate::MatchResult::Rejected`] outcome and not represented here

use labkit_model::ModelError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid procedure, question bank or document
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Invalid engine configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Scoring strategy name not registered
    #[error("unknown scoring strategy: '{0}'")]
    UnknownStrategy(String),

    /// Requested procedure does not exist
    #[error("no procedure with id '{0}'")]
    NoProcedure(String),

    /// An answer arrived while no assessment is running
    #[error("no assessment is in progress")]
    NoAssessment,

    /// Caller broke an engine contract (strict mode only)
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
}

impl EngineError {
    /// Whether the error comes from content or configuration
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Model(_) | Self::Config(_) | Self::UnknownStrategy(_) | Self::NoProcedure(_)
        )
    }

    /// Whether the session can keep going after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoAssessment | Self::Contract(_))
    }
}

/// Caller contract violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// The UI forwarded an event the engine does not classify
    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),

    /// A question was answered twice
    #[error("question {question} was already answered")]
    AlreadyAnswered {
        /// Question index
        question: usize,
    },

    /// A question was answered out of order
    #[error("expected an answer to question {expected}, got question {got}")]
    OutOfOrder {
        /// Current question
        expected: usize,
        /// Question the caller tried to answer
        got: usize,
    },

    /// The chosen option does not exist
    #[error("option {option} does not exist (question has {count} options)")]
    OptionOutOfRange {
        /// Chosen option
        option: usize,
        /// Number of options
        count: usize,
    },

    /// The attempt already finished
    #[error("assessment already finished")]
    Finished,
}

/// Report a contract violation
///
/// Panics under the `strict-debug` feature; otherwise logs and hands the
/// violation back so callers can decide whether to surface it.
pub(crate) fn violation(violation: ContractViolation) -> ContractViolation {
    #[cfg(feature = "strict-debug")]
    panic!("contract violation: {violation}");

    #[cfg(not(feature = "strict-debug"))]
    {
        tracing::warn!(%violation, "Ignoring contract violation");
        violation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labkit_model::ProcedureId;

    #[test]
    fn classification() {
        let model = EngineError::from(ModelError::EmptyProcedure(ProcedureId::new("p")));
        assert!(model.is_configuration());
        assert!(!model.is_recoverable());

        let contract = EngineError::from(ContractViolation::Finished);
        assert!(contract.is_recoverable());
        assert!(!contract.is_configuration());
    }

    #[test]
    fn display() {
        let err = ContractViolation::OutOfOrder { expected: 1, got: 3 };
        assert_eq!(err.to_string(), "expected an answer to question 1, got question 3");
        assert!(EngineError::NoAssessment.to_string().contains("no assessment"));
    }
}
