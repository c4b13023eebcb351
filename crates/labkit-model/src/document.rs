//! Lab documents
//!
//! A [`LabDocument`] bundles a catalog, a set of procedures and their
//! question banks. Documents are authored as JSON, YAML or TOML (or produced
//! upstream by a content generator) and fully validated on load, so every
//! configuration error surfaces before a learner starts a run.

use crate::assessment::{Assessment, AssessmentDef};
use crate::catalog::{Catalog, CatalogDef};
use crate::error::ModelError;
use crate::ids::ProcedureId;
use crate::procedure::{Procedure, ProcedureDef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported document encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl DocumentFormat {
    /// Map a file extension (without the dot) to a format
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Detect the format of `path` from its extension
    ///
    /// # Errors
    /// [`ModelError::UnsupportedFormat`] for unknown or missing extensions.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| ModelError::UnsupportedFormat(ext.to_string()))
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        })
    }
}

/// Raw, unvalidated document shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDef {
    /// Equipment and reagents
    #[serde(default)]
    pub catalog: CatalogDef,
    /// Procedures in display order
    #[serde(default)]
    pub procedures: Vec<ProcedureDef>,
    /// Question banks, at most one per procedure
    #[serde(default)]
    pub assessments: Vec<AssessmentDef>,
}

/// A validated set of procedures, question banks and catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabDocument {
    catalog: Catalog,
    procedures: IndexMap<ProcedureId, Procedure>,
    assessments: IndexMap<ProcedureId, Assessment>,
}

impl LabDocument {
    /// Parse and validate a document
    ///
    /// # Errors
    /// [`ModelError::Parse`] for malformed text, otherwise the first
    /// configuration error found.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, ModelError> {
        let def: DocumentDef = match format {
            DocumentFormat::Json => {
                serde_json::from_str(content).map_err(|e| ModelError::parse(format, e))?
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| ModelError::parse(format, e))?
            }
            DocumentFormat::Toml => {
                toml::from_str(content).map_err(|e| ModelError::parse(format, e))?
            }
        };
        Self::from_def(def)
    }

    /// Read, parse and validate a document file
    ///
    /// # Errors
    /// IO, format detection, parse or validation failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::parse(&content, format)?;
        tracing::info!(
            path = %path.display(),
            procedures = document.procedures.len(),
            assessments = document.assessments.len(),
            "Loaded lab document"
        );
        Ok(document)
    }

    /// Validate a raw document
    ///
    /// # Errors
    /// Duplicate ids, invalid procedures or banks, banks for unknown
    /// procedures, or ids missing from a non-empty catalog.
    pub fn from_def(def: DocumentDef) -> Result<Self, ModelError> {
        let catalog = Catalog::try_from(def.catalog)?;

        let mut procedures = IndexMap::with_capacity(def.procedures.len());
        for raw in def.procedures {
            let procedure = Procedure::try_from(raw)?;
            if procedures.contains_key(procedure.id()) {
                return Err(ModelError::DuplicateProcedure(procedure.id().clone()));
            }
            if !catalog.is_empty() {
                catalog.check_procedure(&procedure)?;
            }
            procedures.insert(procedure.id().clone(), procedure);
        }

        let mut assessments = IndexMap::with_capacity(def.assessments.len());
        for raw in def.assessments {
            let assessment = Assessment::try_from(raw)?;
            let id = assessment.procedure_id().clone();
            if !procedures.contains_key(&id) {
                return Err(ModelError::UnknownProcedure(id));
            }
            if assessments.contains_key(&id) {
                return Err(ModelError::DuplicateAssessment(id));
            }
            assessments.insert(id, assessment);
        }

        Ok(Self {
            catalog,
            procedures,
            assessments,
        })
    }

    /// Encode the document
    ///
    /// # Errors
    /// [`ModelError::Parse`] if the encoder rejects the content.
    pub fn render(&self, format: DocumentFormat) -> Result<String, ModelError> {
        let def = self.to_def();
        match format {
            DocumentFormat::Json => {
                serde_json::to_string_pretty(&def).map_err(|e| ModelError::parse(format, e))
            }
            DocumentFormat::Yaml => {
                serde_yaml::to_string(&def).map_err(|e| ModelError::parse(format, e))
            }
            DocumentFormat::Toml => {
                toml::to_string_pretty(&def).map_err(|e| ModelError::parse(format, e))
            }
        }
    }

    fn to_def(&self) -> DocumentDef {
        DocumentDef {
            catalog: self.catalog.clone().into(),
            procedures: self.procedures.values().cloned().map(Into::into).collect(),
            assessments: self.assessments.values().cloned().map(Into::into).collect(),
        }
    }

    /// Equipment and reagents
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Look up a procedure
    #[inline]
    #[must_use]
    pub fn procedure(&self, id: &str) -> Option<&Procedure> {
        self.procedures.get(id)
    }

    /// Procedures in document order
    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    /// Question bank for a procedure, if any
    #[inline]
    #[must_use]
    pub fn assessment(&self, procedure_id: &str) -> Option<&Assessment> {
        self.assessments.get(procedure_id)
    }

    /// Number of procedures
    #[inline]
    #[must_use]
    pub fn procedure_count(&self) -> usize {
        self.procedures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const YAML: &str = r"
catalog:
  tools:
    - { id: test_tube, display_name: Test Tube, category: glassware }
  resources:
    - { id: fe, display_name: Iron Filings, category: metal }
    - { id: hcl, display_name: Hydrochloric Acid, category: acid }
procedures:
  - id: iron-hcl
    title: Iron and Hydrochloric Acid
    difficulty: easy
    steps:
      - prompt: Pick up a test tube
        criteria: { kind: select_tool, tool_id: test_tube }
      - prompt: Add iron filings
        criteria: { kind: add_resource, resource_id: fe }
      - prompt: Add hydrochloric acid
        criteria: { kind: add_resource, resource_id: hcl }
        visual_effect: bubbles
      - prompt: Observe the gas
        criteria: { kind: observe }
assessments:
  - procedure_id: iron-hcl
    questions:
      - prompt: Which gas is released?
        options: [Oxygen, Hydrogen]
        correct_option_index: 1
";

    #[test]
    fn format_detection() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("lab.YML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert!(matches!(
            DocumentFormat::from_path(&PathBuf::from("lab.ini")),
            Err(ModelError::UnsupportedFormat(ext)) if ext == "ini"
        ));
        assert!(DocumentFormat::from_path(&PathBuf::from("lab")).is_err());
    }

    #[test]
    fn parses_yaml_document() {
        let doc = LabDocument::parse(YAML, DocumentFormat::Yaml).unwrap();
        assert_eq!(doc.procedure_count(), 1);
        let procedure = doc.procedure("iron-hcl").unwrap();
        assert_eq!(procedure.step_count(), 4);
        assert_eq!(procedure.steps()[2].visual_effect.as_deref(), Some("bubbles"));
        assert_eq!(doc.assessment("iron-hcl").unwrap().question_count(), 1);
    }

    #[test]
    fn assessment_for_unknown_procedure_is_rejected() {
        let raw = r#"{"assessments":[{"procedure_id":"ghost","questions":[{"prompt":"Q?","options":["a","b"],"correct_option_index":0}]}]}"#;
        let err = LabDocument::parse(raw, DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, ModelError::UnknownProcedure(id) if id.as_str() == "ghost"));
    }

    #[test]
    fn catalog_is_enforced_when_present() {
        let raw = YAML.replace("resource_id: fe", "resource_id: zn");
        let err = LabDocument::parse(&raw, DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, ModelError::UnknownResource { .. }));
    }

    #[test]
    fn duplicate_procedure_is_rejected() {
        let raw = r#"{"procedures":[
            {"id":"p","title":"P","steps":[{"prompt":"Look","criteria":{"kind":"observe"}}]},
            {"id":"p","title":"P2","steps":[{"prompt":"Look","criteria":{"kind":"observe"}}]}
        ]}"#;
        let err = LabDocument::parse(raw, DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateProcedure(_)));
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let err = LabDocument::parse("procedures = [", DocumentFormat::Toml).unwrap_err();
        assert!(matches!(err, ModelError::Parse { format: DocumentFormat::Toml, .. }));
    }

    #[test]
    fn parses_toml_document() {
        let raw = r#"
[[procedures]]
id = "heat-water"
title = "Boil Water"
difficulty = "medium"

[[procedures.steps]]
prompt = "Light the burner"
criteria = { kind = "apply_heat" }
resulting_state_tag = "boiling"

[[procedures.steps]]
prompt = "Watch the steam"
criteria = { kind = "observe" }
"#;
        let doc = LabDocument::parse(raw, DocumentFormat::Toml).unwrap();
        let procedure = doc.procedure("heat-water").unwrap();
        assert_eq!(procedure.difficulty(), crate::procedure::Difficulty::Medium);
        assert_eq!(procedure.steps()[0].resulting_state_tag.as_deref(), Some("boiling"));
    }

    #[test]
    fn renders_and_reparses_as_json() {
        let doc = LabDocument::parse(YAML, DocumentFormat::Yaml).unwrap();
        let text = doc.render(DocumentFormat::Json).unwrap();
        let back = LabDocument::parse(&text, DocumentFormat::Json).unwrap();
        assert_eq!(back, doc);
    }
}
