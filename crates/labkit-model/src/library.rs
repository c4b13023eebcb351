//! Built-in experiment library

use crate::document::{DocumentFormat, LabDocument};
use crate::error::ModelError;

const LIBRARY_YAML: &str = include_str!("../data/library.yaml");

impl LabDocument {
    /// The chemistry experiments shipped with labkit
    ///
    /// # Errors
    /// Only if the embedded library is itself invalid.
    pub fn builtin() -> Result<Self, ModelError> {
        Self::parse(LIBRARY_YAML, DocumentFormat::Yaml)
    }
}
