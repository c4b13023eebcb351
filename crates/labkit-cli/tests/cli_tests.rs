//! Command tests against captured output
//!
use labkit_cli::{commands, parse_script, RunOptions};
use labkit_engine::test_harness::SimulatorConfig;
use labkit_engine::EngineConfig;
use labkit_test_utils::SAMPLE_YAML;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn capture<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>),
{
    let mut out = Vec::new();
    f(&mut out);
    String::from_utf8(out).unwrap()
}

#[test]
fn test_validate_good_document() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "salt.yaml", SAMPLE_YAML);

    let mut ok = false;
    let text = capture(|out| ok = commands::validate(&path, out).unwrap());

    assert!(ok);
    assert!(text.starts_with("OK "));
    assert!(text.contains("dissolve-salt"));
    assert!(text.contains(" 4 steps"));
    assert!(text.contains(" 1 questions"));
}

#[test]
fn test_validate_rejects_empty_procedure() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "broken.json",
        r#"{"procedures": [{"id": "empty", "title": "Nothing", "steps": []}]}"#,
    );

    let mut ok = true;
    let text = capture(|out| ok = commands::validate(&path, out).unwrap());

    assert!(!ok);
    assert!(text.starts_with("INVALID"));
    assert!(text.contains("no steps"));
}

#[test]
fn test_list_builtin_library() {
    let document = commands::load_document(None).unwrap();
    let text = capture(|out| commands::list(&document, out).unwrap());
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("iron-hcl"));
    assert!(text.contains("Iron and Hydrochloric Acid"));
}

#[test]
fn test_run_transcript() {
    let document = commands::load_document(None).unwrap();
    let options = RunOptions {
        actions: parse_script("add:fe\ntool:test_tube, add:fe, add:hcl, observe").unwrap(),
        answers: vec![],
        json: false,
    };

    let text = capture(|out| {
        commands::run(&document, "iron-hcl", EngineConfig::default(), &options, out).unwrap();
    });

    assert!(text.contains("> add_resource(fe) [rejected]"));
    assert!(text.contains("  Not quite. Select a test tube from the rack."));
    assert!(text.contains("> observe [accepted]"));
    assert!(text.contains("Procedure complete!"));
    assert!(text.contains("Quiz unfinished: 0/"));
}

#[test]
fn test_run_incomplete_reports_progress() {
    let document = commands::load_document(None).unwrap();
    let options = RunOptions {
        actions: parse_script("tool:test_tube").unwrap(),
        ..RunOptions::default()
    };
    let text = capture(|out| {
        commands::run(&document, "iron-hcl", EngineConfig::default(), &options, out).unwrap();
    });
    assert!(text.contains("Incomplete: 1/4 steps (25%)"));
}

#[test]
fn test_run_json_journal() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "salt.yaml", SAMPLE_YAML);
    let document = commands::load_document(Some(path.as_path())).unwrap();
    let options = RunOptions {
        actions: parse_script("tool:beaker, add:salt, add:water, add:salt, observe").unwrap(),
        answers: vec![1],
        json: true,
    };

    let text = capture(|out| {
        commands::run(&document, "dissolve-salt", EngineConfig::default(), &options, out).unwrap();
    });

    let journal: serde_json::Value = serde_json::from_str(&text).unwrap();
    let outcomes: Vec<&str> = journal["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(
        outcomes,
        vec!["accepted", "rejected", "accepted", "accepted", "accepted"]
    );
}

#[test]
fn test_run_with_answers_and_config() {
    let dir = TempDir::new().unwrap();
    let doc_path = write(&dir, "salt.yaml", SAMPLE_YAML);
    let config_path = write(
        &dir,
        "labkit.toml",
        "[rewards]\ncompletion_xp = 20\nper_correct_xp = 5\n",
    );
    let document = commands::load_document(Some(doc_path.as_path())).unwrap();
    let config = commands::load_config(Some(config_path.as_path())).unwrap();
    let options = RunOptions {
        actions: parse_script("tool:beaker, add:water, add:salt, observe").unwrap(),
        answers: vec![1],
        json: false,
    };

    let text = capture(|out| {
        commands::run(&document, "dissolve-salt", config, &options, out).unwrap();
    });

    assert!(text.contains("Q1: correct"));
    assert!(text.contains("Score: 1/1"));
    assert!(text.contains("XP: 25"));
}

#[test]
fn test_run_unknown_procedure() {
    let document = commands::load_document(None).unwrap();
    let mut out = Vec::new();
    let err = commands::run(
        &document,
        "volcano",
        EngineConfig::default(),
        &RunOptions::default(),
        &mut out,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("volcano"));
}

#[test]
fn test_simulate_passes_on_builtin() {
    let document = commands::load_document(None).unwrap();
    let config = SimulatorConfig {
        runs: 100,
        ..SimulatorConfig::default()
    };
    let mut passed = false;
    let text = capture(|out| passed = commands::simulate(&document, config, out).unwrap());
    assert!(passed);
    assert!(text.contains("Runs: 100"));
}

#[test]
fn test_certify_builtin() {
    let document = commands::load_document(None).unwrap();
    let mut passed = false;
    let text = capture(|out| passed = commands::certify(&document, 10, out).unwrap());
    assert!(passed);
    assert!(text.contains("Status: PASSED"));
}
