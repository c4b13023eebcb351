//! Procedures and their steps
//!
//! A [`Procedure`] is an ordered, non-empty list of [`Step`]s. It is built
//! once from static configuration and never changes during a run. The only
//! ways to obtain one are [`Procedure::new`], [`ProcedureBuilder::build`] or
//! deserialization, and all three validate the content.

use crate::error::ModelError;
use crate::ids::{ProcedureId, ResourceId, ToolId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordinal difficulty of a procedure
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Introductory
    #[default]
    Easy,
    /// Intermediate
    Medium,
    /// Advanced
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        };
        f.write_str(label)
    }
}

/// Condition a user action must satisfy to complete a step
///
/// Exactly one criteria per step; multi-criteria steps are not supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criteria {
    /// Pick up a specific tool
    SelectTool {
        /// Tool that must be selected
        tool_id: ToolId,
    },
    /// Add a specific resource to the vessel
    AddResource {
        /// Resource that must be added
        resource_id: ResourceId,
    },
    /// Explicitly acknowledge an observation
    Observe,
    /// Turn on the heat source
    ApplyHeat,
}

impl Criteria {
    /// Short label of the criteria kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SelectTool { .. } => "select_tool",
            Self::AddResource { .. } => "add_resource",
            Self::Observe => "observe",
            Self::ApplyHeat => "apply_heat",
        }
    }
}

/// One unit of required progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Instruction shown to the learner
    pub prompt: String,
    /// Line narrated when the step becomes current
    #[serde(default)]
    pub narration: String,
    /// What completes the step
    pub criteria: Criteria,
    /// Opaque tag the UI uses to animate success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_effect: Option<String>,
    /// State label applied to the vessel on success (e.g. a color)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resulting_state_tag: Option<String>,
}

impl Step {
    /// Create a step; narration defaults to the prompt
    #[must_use]
    pub fn new(prompt: impl Into<String>, criteria: Criteria) -> Self {
        let prompt = prompt.into();
        Self {
            narration: prompt.clone(),
            prompt,
            criteria,
            visual_effect: None,
            resulting_state_tag: None,
        }
    }

    /// Step that requires selecting `tool`
    #[must_use]
    pub fn select_tool(prompt: impl Into<String>, tool: impl Into<ToolId>) -> Self {
        Self::new(
            prompt,
            Criteria::SelectTool {
                tool_id: tool.into(),
            },
        )
    }

    /// Step that requires adding `resource`
    #[must_use]
    pub fn add_resource(prompt: impl Into<String>, resource: impl Into<ResourceId>) -> Self {
        Self::new(
            prompt,
            Criteria::AddResource {
                resource_id: resource.into(),
            },
        )
    }

    /// Step that requires an explicit observation
    #[must_use]
    pub fn observe(prompt: impl Into<String>) -> Self {
        Self::new(prompt, Criteria::Observe)
    }

    /// Step that requires applying heat
    #[must_use]
    pub fn apply_heat(prompt: impl Into<String>) -> Self {
        Self::new(prompt, Criteria::ApplyHeat)
    }

    /// Set the narration line
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = narration.into();
        self
    }

    /// Set the visual effect tag
    #[must_use]
    pub fn with_visual_effect(mut self, effect: impl Into<String>) -> Self {
        self.visual_effect = Some(effect.into());
        self
    }

    /// Set the resulting state tag
    #[must_use]
    pub fn with_state_tag(mut self, tag: impl Into<String>) -> Self {
        self.resulting_state_tag = Some(tag.into());
        self
    }

    fn validate(&mut self, procedure: &ProcedureId, index: usize) -> Result<(), ModelError> {
        let context = || format!("procedure '{procedure}' step {index}");
        if self.prompt.trim().is_empty() {
            return Err(ModelError::missing(context(), "prompt"));
        }
        match &self.criteria {
            Criteria::SelectTool { tool_id } if tool_id.is_blank() => {
                return Err(ModelError::missing(context(), "tool_id"));
            }
            Criteria::AddResource { resource_id } if resource_id.is_blank() => {
                return Err(ModelError::missing(context(), "resource_id"));
            }
            _ => {}
        }
        if self.narration.trim().is_empty() {
            self.narration.clone_from(&self.prompt);
        }
        Ok(())
    }
}

/// Serialized form of a [`Procedure`]
///
/// Documents are decoded into this shape first and then validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureDef {
    /// Procedure id
    pub id: ProcedureId,
    /// Display title
    pub title: String,
    /// What the learner should take away
    #[serde(default)]
    pub objective: String,
    /// Ordinal difficulty
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Extra resources to offer beyond the ones the steps reference
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required_resources: BTreeSet<ResourceId>,
}

/// An ordered, immutable guided exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProcedureDef", into = "ProcedureDef")]
pub struct Procedure {
    id: ProcedureId,
    title: String,
    objective: String,
    difficulty: Difficulty,
    steps: Vec<Step>,
    required_resources: BTreeSet<ResourceId>,
    required_tools: BTreeSet<ToolId>,
}

impl Procedure {
    /// Build and validate a procedure
    ///
    /// # Errors
    /// [`ModelError::EmptyProcedure`] when `steps` is empty and
    /// [`ModelError::MissingField`] for blank ids, titles or prompts.
    pub fn new(
        id: impl Into<ProcedureId>,
        title: impl Into<String>,
        objective: impl Into<String>,
        difficulty: Difficulty,
        steps: Vec<Step>,
    ) -> Result<Self, ModelError> {
        Self::try_from(ProcedureDef {
            id: id.into(),
            title: title.into(),
            objective: objective.into(),
            difficulty,
            steps,
            required_resources: BTreeSet::new(),
        })
    }

    /// Start a fluent builder
    #[must_use]
    pub fn builder(id: impl Into<ProcedureId>, title: impl Into<String>) -> ProcedureBuilder {
        ProcedureBuilder::new(id, title)
    }

    /// Procedure id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ProcedureId {
        &self.id
    }

    /// Display title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Learning objective
    #[inline]
    #[must_use]
    pub fn objective(&self) -> &str {
        &self.objective
    }

    /// Difficulty
    #[inline]
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// All steps in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step at `index`
    #[inline]
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Number of steps, never zero
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Whether `index` is the final step
    #[inline]
    #[must_use]
    pub fn is_final_step(&self, index: usize) -> bool {
        index + 1 == self.steps.len()
    }

    /// Resources referenced by any step, plus declared extras
    #[inline]
    #[must_use]
    pub fn required_resources(&self) -> &BTreeSet<ResourceId> {
        &self.required_resources
    }

    /// Tools referenced by any step
    #[inline]
    #[must_use]
    pub fn required_tools(&self) -> &BTreeSet<ToolId> {
        &self.required_tools
    }

    /// Resources added by the steps, in step order
    pub fn resource_sequence(&self) -> impl Iterator<Item = &ResourceId> {
        self.steps.iter().filter_map(|step| match &step.criteria {
            Criteria::AddResource { resource_id } => Some(resource_id),
            _ => None,
        })
    }
}

impl TryFrom<ProcedureDef> for Procedure {
    type Error = ModelError;

    fn try_from(def: ProcedureDef) -> Result<Self, Self::Error> {
        let ProcedureDef {
            id,
            title,
            objective,
            difficulty,
            mut steps,
            mut required_resources,
        } = def;

        if id.is_blank() {
            return Err(ModelError::missing("procedure", "id"));
        }
        if title.trim().is_empty() {
            return Err(ModelError::missing(format!("procedure '{id}'"), "title"));
        }
        if steps.is_empty() {
            return Err(ModelError::EmptyProcedure(id));
        }

        let mut required_tools = BTreeSet::new();
        for (index, step) in steps.iter_mut().enumerate() {
            step.validate(&id, index)?;
            match &step.criteria {
                Criteria::SelectTool { tool_id } => {
                    required_tools.insert(tool_id.clone());
                }
                Criteria::AddResource { resource_id } => {
                    required_resources.insert(resource_id.clone());
                }
                Criteria::Observe | Criteria::ApplyHeat => {}
            }
        }

        Ok(Self {
            id,
            title,
            objective,
            difficulty,
            steps,
            required_resources,
            required_tools,
        })
    }
}

impl From<Procedure> for ProcedureDef {
    fn from(procedure: Procedure) -> Self {
        Self {
            id: procedure.id,
            title: procedure.title,
            objective: procedure.objective,
            difficulty: procedure.difficulty,
            steps: procedure.steps,
            required_resources: procedure.required_resources,
        }
    }
}

/// Fluent builder for [`Procedure`]
#[derive(Debug, Clone)]
pub struct ProcedureBuilder {
    def: ProcedureDef,
}

impl ProcedureBuilder {
    /// Create a builder
    #[must_use]
    pub fn new(id: impl Into<ProcedureId>, title: impl Into<String>) -> Self {
        Self {
            def: ProcedureDef {
                id: id.into(),
                title: title.into(),
                objective: String::new(),
                difficulty: Difficulty::default(),
                steps: Vec::new(),
                required_resources: BTreeSet::new(),
            },
        }
    }

    /// Set the objective
    #[must_use]
    pub fn objective(mut self, objective: impl Into<String>) -> Self {
        self.def.objective = objective.into();
        self
    }

    /// Set the difficulty
    #[must_use]
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.def.difficulty = difficulty;
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.def.steps.push(step);
        self
    }

    /// Append several steps in order
    #[must_use]
    pub fn steps_from(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.def.steps.extend(steps);
        self
    }

    /// Declare an extra resource to offer
    #[must_use]
    pub fn offer_resource(mut self, resource: impl Into<ResourceId>) -> Self {
        self.def.required_resources.insert(resource.into());
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// Same as [`Procedure::new`].
    pub fn build(self) -> Result<Procedure, ModelError> {
        Procedure::try_from(self.def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn iron_hcl() -> Procedure {
        Procedure::builder("iron-hcl", "Iron and Hydrochloric Acid")
            .objective("Produce hydrogen gas")
            .step(Step::select_tool("Pick up a test tube", "test_tube"))
            .step(Step::add_resource("Add iron filings", "fe"))
            .step(Step::add_resource("Add hydrochloric acid", "hcl").with_state_tag("pale-green"))
            .step(Step::observe("Observe the bubbles"))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_derives_required_sets() {
        let procedure = iron_hcl();
        assert_eq!(procedure.step_count(), 4);
        assert!(procedure.required_resources().contains("fe"));
        assert!(procedure.required_resources().contains("hcl"));
        assert!(procedure.required_tools().contains("test_tube"));
        let sequence: Vec<_> = procedure.resource_sequence().map(ResourceId::as_str).collect();
        assert_eq!(sequence, vec!["fe", "hcl"]);
    }

    #[test]
    fn empty_steps_are_rejected() {
        let err = Procedure::new("empty", "Empty", "", Difficulty::Easy, vec![]).unwrap_err();
        assert!(matches!(err, ModelError::EmptyProcedure(id) if id.as_str() == "empty"));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = Procedure::builder("p", "P")
            .step(Step::observe("   "))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingField { field: "prompt", .. }));
    }

    #[test]
    fn blank_tool_is_rejected() {
        let err = Procedure::builder("p", "P")
            .step(Step::select_tool("Pick", ""))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingField { field: "tool_id", .. }));
    }

    #[test]
    fn narration_falls_back_to_prompt() {
        let procedure = Procedure::builder("p", "P")
            .step(Step::observe("Watch closely").with_narration(""))
            .build()
            .unwrap();
        assert_eq!(procedure.steps()[0].narration, "Watch closely");
    }

    #[test]
    fn final_step_detection() {
        let procedure = iron_hcl();
        assert!(!procedure.is_final_step(2));
        assert!(procedure.is_final_step(3));
    }

    #[test]
    fn criteria_json_shape() {
        let json = serde_json::to_value(Criteria::SelectTool {
            tool_id: ToolId::new("test_tube"),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"kind": "select_tool", "tool_id": "test_tube"}));

        let observe: Criteria = serde_json::from_str(r#"{"kind":"observe"}"#).unwrap();
        assert_eq!(observe, Criteria::Observe);
    }

    #[test]
    fn deserialization_validates() {
        let raw = r#"{"id":"p","title":"P","steps":[]}"#;
        assert!(serde_json::from_str::<Procedure>(raw).is_err());

        let raw = r#"{"id":"p","title":"P","steps":[{"prompt":"Heat it","criteria":{"kind":"apply_heat"}}]}"#;
        let procedure: Procedure = serde_json::from_str(raw).unwrap();
        assert_eq!(procedure.steps()[0].criteria, Criteria::ApplyHeat);
        assert_eq!(procedure.steps()[0].narration, "Heat it");
    }

    #[test]
    fn difficulty_is_ordinal() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
    }
}
