//! Testing utilities for labkit workspace
//!
//! Shared fixtures: the reference iron/acid procedure, a two-question bank,
//! action scripts and a small YAML document.

#![allow(missing_docs)]

use labkit_engine::{Action, EngineConfig, LabSession, NarrationBuffer};
use labkit_model::{Assessment, Criteria, Procedure, Question, Step};

/// Four-step iron and hydrochloric acid procedure
pub fn scenario_procedure() -> Procedure {
    Procedure::builder("iron-hcl", "Iron and Hydrochloric Acid")
        .objective("Observe a metal displacing hydrogen from an acid")
        .step(
            Step::select_tool("Select a test tube from the rack.", "test_tube")
                .with_visual_effect("lift"),
        )
        .step(
            Step::add_resource("Add iron filings to the test tube.", "fe")
                .with_state_tag("grey-solid"),
        )
        .step(Step::add_resource("Add dilute hydrochloric acid.", "hcl").with_state_tag("bubbling"))
        .step(Step::observe("Observe the bubbles of hydrogen gas."))
        .build()
        .unwrap()
}

/// Two questions whose correct options are `[1, 0]`
pub fn two_question_assessment() -> Assessment {
    Assessment::new(
        "iron-hcl",
        vec![
            Question::new("Which gas is released?", ["Oxygen", "Hydrogen", "Chlorine"], 1)
                .with_explanation("Iron displaces hydrogen from the acid."),
            Question::new("What colour does the solution turn?", ["Pale green", "Deep blue"], 0)
                .with_explanation("Iron(II) chloride is pale green."),
        ],
    )
    .unwrap()
}

/// The action that satisfies `criteria`
pub fn action_for(criteria: &Criteria) -> Action {
    match criteria {
        Criteria::SelectTool { tool_id } => Action::select_tool(tool_id.clone()),
        Criteria::AddResource { resource_id } => Action::add_resource(resource_id.clone()),
        Criteria::Observe => Action::Observe,
        Criteria::ApplyHeat => Action::ApplyHeat,
    }
}

/// An action that never satisfies `criteria`
pub fn wrong_action_for(criteria: &Criteria) -> Action {
    match criteria {
        Criteria::SelectTool { tool_id } => Action::select_tool(format!("not-{tool_id}")),
        Criteria::AddResource { .. } => Action::Observe,
        Criteria::Observe => Action::ApplyHeat,
        Criteria::ApplyHeat => Action::Observe,
    }
}

/// Correct actions for every step, in order
pub fn correct_actions(procedure: &Procedure) -> Vec<Action> {
    procedure.steps().iter().map(|step| action_for(&step.criteria)).collect()
}

/// Guided session over the scenario procedure and quiz
pub fn setup_session(config: EngineConfig) -> LabSession<NarrationBuffer> {
    LabSession::guided(
        scenario_procedure(),
        Some(two_question_assessment()),
        config,
        NarrationBuffer::new(),
    )
    .unwrap()
}

/// Minimal YAML document with one procedure and its quiz
pub const SAMPLE_YAML: &str = r#"
catalog:
  tools:
    - id: beaker
      display_name: Beaker
      category: glassware
  resources:
    - id: water
      display_name: Water
      category: solvent
    - id: salt
      display_name: Table salt
      category: salt
procedures:
  - id: dissolve-salt
    title: Dissolving Salt
    objective: Watch salt dissolve in water
    steps:
      - prompt: Take a beaker.
        criteria: { kind: select_tool, tool_id: beaker }
      - prompt: Pour in some water.
        criteria: { kind: add_resource, resource_id: water }
      - prompt: Add a spoon of salt.
        criteria: { kind: add_resource, resource_id: salt }
      - prompt: Watch the crystals disappear.
        criteria: { kind: observe }
assessments:
  - procedure_id: dissolve-salt
    questions:
      - prompt: Where did the salt go?
        options: [It evaporated, It dissolved]
        correct_option_index: 1
"#;
