//! Error types for the lab data model
//!
//! Every variant here is a configuration error: it is detected while a
//! procedure, question bank, catalog or document is being loaded, before any
//! run starts. A configuration error is fatal to starting the affected
//! procedure or assessment, never to the host application.

use crate::document::DocumentFormat;
use crate::ids::{ProcedureId, ResourceId, ToolId};
use std::path::PathBuf;

/// Errors raised while building or loading lab content
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A procedure was declared without any steps
    #[error("procedure '{0}' has no steps")]
    EmptyProcedure(ProcedureId),

    /// A required text field is blank
    #[error("missing required field '{field}' in {context}")]
    MissingField {
        /// Where the field was expected
        context: String,
        /// Field name
        field: &'static str,
    },

    /// A question bank without questions
    #[error("assessment for '{0}' has no questions")]
    EmptyAssessment(ProcedureId),

    /// A question with fewer than two options
    #[error("question {question} has {count} option(s), at least 2 are required")]
    TooFewOptions {
        /// Question position in its bank
        question: usize,
        /// Number of options found
        count: usize,
    },

    /// Two options of one question share the same text
    #[error("question {question} repeats option '{option}'")]
    DuplicateOption {
        /// Question position in its bank
        question: usize,
        /// The repeated option text
        option: String,
    },

    /// The correct option index points past the option list
    #[error("question {question} marks option {index} correct but has only {count} options")]
    CorrectOptionOutOfRange {
        /// Question position in its bank
        question: usize,
        /// Declared correct index
        index: usize,
        /// Number of options
        count: usize,
    },

    /// A procedure references a resource the catalog does not know
    #[error("procedure '{procedure}' uses unknown resource '{resource}'")]
    UnknownResource {
        /// Referencing procedure
        procedure: ProcedureId,
        /// Missing resource
        resource: ResourceId,
    },

    /// A procedure references a tool the catalog does not know
    #[error("procedure '{procedure}' uses unknown tool '{tool}'")]
    UnknownTool {
        /// Referencing procedure
        procedure: ProcedureId,
        /// Missing tool
        tool: ToolId,
    },

    /// An assessment is attached to a procedure that does not exist
    #[error("assessment references unknown procedure '{0}'")]
    UnknownProcedure(ProcedureId),

    /// Two procedures share one id
    #[error("procedure '{0}' is defined more than once")]
    DuplicateProcedure(ProcedureId),

    /// Two assessments target the same procedure
    #[error("procedure '{0}' has more than one assessment")]
    DuplicateAssessment(ProcedureId),

    /// Two catalog entries share one id
    #[error("catalog entry '{0}' is defined more than once")]
    DuplicateCatalogEntry(String),

    /// Document text could not be parsed
    #[error("failed to parse {format} document: {message}")]
    Parse {
        /// Format that was attempted
        format: DocumentFormat,
        /// Parser message
        message: String,
    },

    /// File extension does not map to a known format
    #[error("unsupported document format: '{0}'")]
    UnsupportedFormat(String),

    /// IO error while reading a document
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    /// Create a missing field error
    pub fn missing(context: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            context: context.into(),
            field,
        }
    }

    /// Create a parse error for a format
    pub fn parse(format: DocumentFormat, message: impl ToString) -> Self {
        Self::Parse {
            format,
            message: message.to_string(),
        }
    }

    /// Whether the error stems from the content itself rather than from
    /// reading or decoding it
    #[inline]
    #[must_use]
    pub fn is_content_error(&self) -> bool {
        !matches!(
            self,
            Self::Parse { .. } | Self::UnsupportedFormat(_) | Self::Io { .. }
        )
    }
}
