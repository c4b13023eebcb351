//! Post-procedure question banks

use crate::error::ModelError;
use crate::ids::ProcedureId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Single-answer multiple choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    pub prompt: String,
    /// Answer options, at least two with unique text
    pub options: Vec<String>,
    /// Index of the correct option
    pub correct_option_index: usize,
    /// Shown after the question is answered
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// Create a question
    #[must_use]
    pub fn new<I, S>(prompt: impl Into<String>, options: I, correct_option_index: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prompt: prompt.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_option_index,
            explanation: String::new(),
        }
    }

    /// Set the explanation
    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Whether `option` is the correct answer
    #[inline]
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option_index
    }

    /// Text of the correct option
    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_option_index).map(String::as_str)
    }

    /// Check the question in position `index` of its bank
    ///
    /// # Errors
    /// Blank prompt, fewer than two options, repeated option text or an out
    /// of range correct index.
    pub fn validate(&self, index: usize) -> Result<(), ModelError> {
        if self.prompt.trim().is_empty() {
            return Err(ModelError::missing(format!("question {index}"), "prompt"));
        }
        if self.options.len() < 2 {
            return Err(ModelError::TooFewOptions {
                question: index,
                count: self.options.len(),
            });
        }
        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if !seen.insert(option.trim()) {
                return Err(ModelError::DuplicateOption {
                    question: index,
                    option: option.clone(),
                });
            }
        }
        if self.correct_option_index >= self.options.len() {
            return Err(ModelError::CorrectOptionOutOfRange {
                question: index,
                index: self.correct_option_index,
                count: self.options.len(),
            });
        }
        Ok(())
    }
}

/// Serialized form of an [`Assessment`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentDef {
    /// Procedure this bank belongs to
    pub procedure_id: ProcedureId,
    /// Questions in asking order
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Validated question bank tied to one procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssessmentDef", into = "AssessmentDef")]
pub struct Assessment {
    procedure_id: ProcedureId,
    questions: Vec<Question>,
}

impl Assessment {
    /// Validate and build a question bank
    ///
    /// # Errors
    /// [`ModelError::EmptyAssessment`] or the first invalid question.
    pub fn new(
        procedure_id: impl Into<ProcedureId>,
        questions: Vec<Question>,
    ) -> Result<Self, ModelError> {
        Self::try_from(AssessmentDef {
            procedure_id: procedure_id.into(),
            questions,
        })
    }

    /// Procedure this bank belongs to
    #[inline]
    #[must_use]
    pub fn procedure_id(&self) -> &ProcedureId {
        &self.procedure_id
    }

    /// Questions in asking order
    #[inline]
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Question at `index`
    #[inline]
    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions, never zero
    #[inline]
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

impl TryFrom<AssessmentDef> for Assessment {
    type Error = ModelError;

    fn try_from(def: AssessmentDef) -> Result<Self, Self::Error> {
        if def.questions.is_empty() {
            return Err(ModelError::EmptyAssessment(def.procedure_id));
        }
        for (index, question) in def.questions.iter().enumerate() {
            question.validate(index)?;
        }
        Ok(Self {
            procedure_id: def.procedure_id,
            questions: def.questions,
        })
    }
}

impl From<Assessment> for AssessmentDef {
    fn from(assessment: Assessment) -> Self {
        Self {
            procedure_id: assessment.procedure_id,
            questions: assessment.questions,
        }
    }
}
