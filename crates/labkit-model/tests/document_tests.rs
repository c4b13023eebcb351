//! Loading lab documents from disk and construction-time validation.

use labkit_model::{
    Criteria, DocumentFormat, LabDocument, ModelError, Procedure, ResourceId, Step,
};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::io::Write;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_json_file() {
    let file = write_temp(
        ".json",
        r#"{
            "procedures": [{
                "id": "observe-only",
                "title": "Just Look",
                "steps": [{"prompt": "Look at the flask", "criteria": {"kind": "observe"}}]
            }]
        }"#,
    );
    let doc = LabDocument::load(file.path()).unwrap();
    assert_eq!(doc.procedure_count(), 1);
    assert!(doc.catalog().is_empty());
}

#[test]
fn empty_step_list_fails_at_load_time() {
    let file = write_temp(
        ".yaml",
        "procedures:\n  - id: hollow\n    title: Hollow\n    steps: []\n",
    );
    let err = LabDocument::load(file.path()).unwrap_err();
    assert!(matches!(err, ModelError::EmptyProcedure(id) if id.as_str() == "hollow"));
}

#[test]
fn unknown_extension_is_rejected_before_reading() {
    let err = LabDocument::load("/definitely/not/here.ini").unwrap_err();
    assert!(matches!(err, ModelError::UnsupportedFormat(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = LabDocument::load("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
    assert!(!err.is_content_error());
}

#[test]
fn builtin_library_survives_every_format() {
    let library = LabDocument::builtin().unwrap();
    for format in [DocumentFormat::Json, DocumentFormat::Yaml] {
        let text = library.render(format).unwrap();
        let back = LabDocument::parse(&text, format).unwrap();
        assert_eq!(back, library, "{format} changed the library");
    }
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(|tool| Step::select_tool("Select", tool)),
        "[a-z]{1,6}".prop_map(|resource| Step::add_resource("Add", resource)),
        Just(Step::observe("Observe")),
        Just(Step::apply_heat("Heat")),
    ]
}

proptest! {
    #[test]
    fn prop_required_resources_cover_every_add_step(
        steps in proptest::collection::vec(step_strategy(), 1..12)
    ) {
        let expected: BTreeSet<ResourceId> = steps
            .iter()
            .filter_map(|step| match &step.criteria {
                Criteria::AddResource { resource_id } => Some(resource_id.clone()),
                _ => None,
            })
            .collect();

        let procedure = Procedure::builder("generated", "Generated")
            .steps_from(steps.clone())
            .build()
            .unwrap();

        prop_assert_eq!(procedure.required_resources(), &expected);
        prop_assert_eq!(procedure.step_count(), steps.len());
        prop_assert_eq!(procedure.steps(), steps.as_slice());
    }
}
