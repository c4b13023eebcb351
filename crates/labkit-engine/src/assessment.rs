//! Assessment engine
//!
//! Scores one sequential pass through a question bank. Each question is
//! answered exactly once, in order; anything else is a contract violation
//! and leaves the attempt untouched. No partial credit, no negative marking.

use crate::error::{violation, ContractViolation};
use labkit_model::{Assessment, ProcedureId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feedback for one recorded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    /// Answered question
    pub question_index: usize,
    /// Chosen option
    pub chosen_option_index: usize,
    /// Whether the choice was correct
    pub correct: bool,
    /// The correct option
    pub correct_option_index: usize,
    /// Explanation from the question bank
    pub explanation: String,
    /// Whether this was the last question
    pub finished: bool,
}

/// Final tally of an attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Procedure the bank belongs to
    pub procedure_id: ProcedureId,
    /// Correct answers
    pub score: usize,
    /// Number of questions
    pub total: usize,
    /// Question index to chosen option
    pub answers: BTreeMap<usize, usize>,
}

/// One pass through a question bank
#[derive(Debug, Clone)]
pub struct AssessmentAttempt {
    assessment: Assessment,
    current_question_index: usize,
    score: usize,
    answers: BTreeMap<usize, usize>,
    is_finished: bool,
}

impl AssessmentAttempt {
    /// Start an attempt at the first question
    #[must_use]
    pub fn start(assessment: Assessment) -> Self {
        tracing::info!(
            procedure = %assessment.procedure_id(),
            questions = assessment.question_count(),
            "Assessment started"
        );
        Self {
            assessment,
            current_question_index: 0,
            score: 0,
            answers: BTreeMap::new(),
            is_finished: false,
        }
    }

    /// Record the answer to `question_index`
    ///
    /// # Errors
    /// A [`ContractViolation`] when the question was already answered, is not
    /// the current one, the option does not exist, or the attempt finished.
    /// The attempt is unchanged in every error case.
    pub fn answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<AnswerFeedback, ContractViolation> {
        if self.answers.contains_key(&question_index) {
            return Err(violation(ContractViolation::AlreadyAnswered {
                question: question_index,
            }));
        }
        if self.is_finished {
            return Err(violation(ContractViolation::Finished));
        }
        if question_index != self.current_question_index {
            return Err(violation(ContractViolation::OutOfOrder {
                expected: self.current_question_index,
                got: question_index,
            }));
        }
        let Some(question) = self.assessment.question(question_index) else {
            return Err(violation(ContractViolation::Finished));
        };
        if option_index >= question.options.len() {
            return Err(violation(ContractViolation::OptionOutOfRange {
                option: option_index,
                count: question.options.len(),
            }));
        }

        let correct = question.is_correct(option_index);
        let correct_option_index = question.correct_option_index;
        let explanation = question.explanation.clone();

        self.answers.insert(question_index, option_index);
        if correct {
            self.score += 1;
        }
        self.current_question_index += 1;
        self.is_finished = self.current_question_index >= self.assessment.question_count();

        tracing::debug!(question_index, option_index, correct, "Answer recorded");
        if self.is_finished {
            tracing::info!(
                procedure = %self.assessment.procedure_id(),
                score = self.score,
                total = self.assessment.question_count(),
                "Assessment finished"
            );
        }

        Ok(AnswerFeedback {
            question_index,
            chosen_option_index: option_index,
            correct,
            correct_option_index,
            explanation,
            finished: self.is_finished,
        })
    }

    /// Answer whichever question is current
    ///
    /// # Errors
    /// Same as [`AssessmentAttempt::answer`].
    pub fn answer_current(
        &mut self,
        option_index: usize,
    ) -> Result<AnswerFeedback, ContractViolation> {
        self.answer(self.current_question_index, option_index)
    }

    /// The question bank
    #[inline]
    #[must_use]
    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    /// Index of the next question to answer
    #[inline]
    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    /// Correct answers so far
    #[inline]
    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Recorded answers by question index
    #[inline]
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    /// Whether every question has been answered
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    /// Tally so far
    #[must_use]
    pub fn result(&self) -> AssessmentResult {
        AssessmentResult {
            procedure_id: self.assessment.procedure_id().clone(),
            score: self.score,
            total: self.assessment.question_count(),
            answers: self.answers.clone(),
        }
    }
}
