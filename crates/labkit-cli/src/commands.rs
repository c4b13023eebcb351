//! Subcommand implementations
//!
//! Each command writes its report to `out` so tests can capture it.

use anyhow::{bail, Context, Result};
use labkit_engine::test_harness::{run_simulator, SimulatorConfig, TestHarness};
use labkit_engine::{Action, EngineConfig, LabSession, MatchResult, NarrationBuffer};
use labkit_model::LabDocument;
use std::io::Write;
use std::path::Path;

/// Load `path`, or the built-in library when no file is given
///
/// # Errors
/// Load or validation failures, with the path as context.
pub fn load_document(path: Option<&Path>) -> Result<LabDocument> {
    match path {
        Some(path) => LabDocument::load(path)
            .with_context(|| format!("failed to load lab document {}", path.display())),
        None => LabDocument::builtin().context("built-in library is invalid"),
    }
}

/// Load the engine config, or defaults when no file is given
///
/// # Errors
/// Unreadable or malformed config.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load engine config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Validate a document and print a per-procedure summary
///
/// Returns `false` when the document has configuration errors.
///
/// # Errors
/// Only output failures; content problems are reported in the output.
pub fn validate(path: &Path, out: &mut impl Write) -> Result<bool> {
    let document = match LabDocument::load(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Document rejected");
            writeln!(out, "INVALID {}: {e}", path.display())?;
            return Ok(false);
        }
    };

    writeln!(
        out,
        "OK {} ({} procedures)",
        path.display(),
        document.procedure_count()
    )?;
    for procedure in document.procedures() {
        let questions = document
            .assessment(procedure.id().as_str())
            .map_or(0, |a| a.question_count());
        writeln!(
            out,
            "  {:<24} {:>2} steps  {:>2} questions  {}",
            procedure.id().as_str(),
            procedure.step_count(),
            questions,
            procedure.difficulty()
        )?;
    }
    Ok(true)
}

/// List procedures
///
/// # Errors
/// Output failures.
pub fn list(document: &LabDocument, out: &mut impl Write) -> Result<()> {
    for procedure in document.procedures() {
        writeln!(
            out,
            "{:<24} {:<8} {}",
            procedure.id().as_str(),
            procedure.difficulty().to_string(),
            procedure.title()
        )?;
    }
    Ok(())
}

/// Options for [`run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Actions to replay
    pub actions: Vec<Action>,
    /// Quiz answers, one option index per question
    pub answers: Vec<usize>,
    /// Print the journal as JSON instead of a transcript
    pub json: bool,
}

/// Replay a script against a procedure
///
/// # Errors
/// Unknown procedure, bad config, or output failures.
pub fn run(
    document: &LabDocument,
    procedure_id: &str,
    config: EngineConfig,
    options: &RunOptions,
    out: &mut impl Write,
) -> Result<()> {
    let mut session =
        LabSession::from_document(document, procedure_id, config, NarrationBuffer::new())
            .with_context(|| format!("cannot start procedure '{procedure_id}'"))?;

    session.start();
    let transcript = !options.json;
    if transcript {
        flush_narration(&mut session, out)?;
    }

    for action in &options.actions {
        let outcome = session.submit(action);
        if transcript {
            let verdict = match outcome.result {
                MatchResult::Accepted { .. } => "accepted",
                MatchResult::Rejected { .. } => "rejected",
            };
            writeln!(out, "> {action} [{verdict}]")?;
            flush_narration(&mut session, out)?;
        }
    }

    let complete = session.runner().is_some_and(labkit_engine::ProcedureRunner::is_complete);
    if !complete {
        if options.json {
            writeln!(out, "{}", session.journal().to_json()?)?;
            return Ok(());
        }
        let progress = session.runner().map(labkit_engine::ProcedureRunner::progress);
        if let Some(progress) = progress {
            writeln!(
                out,
                "Incomplete: {}/{} steps ({}%)",
                progress.completed,
                progress.total,
                progress.percent()
            )?;
        }
        return Ok(());
    }

    if session.attempt().is_some() {
        for (question, &option) in options.answers.iter().enumerate() {
            let Some(feedback) = session.answer(question, option)? else {
                bail!("answer {option} to question {} was refused", question + 1);
            };
            if transcript {
                writeln!(
                    out,
                    "Q{}: {}{}",
                    question + 1,
                    if feedback.correct { "correct" } else { "incorrect" },
                    if feedback.explanation.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", feedback.explanation)
                    }
                )?;
            }
        }
    } else if !options.answers.is_empty() {
        tracing::warn!(procedure = procedure_id, "Procedure has no quiz, ignoring answers");
    }

    if options.json {
        writeln!(out, "{}", session.journal().to_json()?)?;
        return Ok(());
    }

    match (session.attempt(), session.award()) {
        (_, Some(award)) => {
            if award.total > 0 {
                writeln!(out, "Score: {}/{}", award.score, award.total)?;
            }
            writeln!(out, "XP: {} (points {})", award.total_xp(), award.points)?;
        }
        (Some(attempt), None) => {
            writeln!(
                out,
                "Quiz unfinished: {}/{} answered",
                attempt.answers().len(),
                attempt.assessment().question_count()
            )?;
        }
        (None, None) => {}
    }
    Ok(())
}

fn flush_narration(session: &mut LabSession<NarrationBuffer>, out: &mut impl Write) -> Result<()> {
    for line in session.sink_mut().take() {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

/// Run the simulator and print its report
///
/// Returns whether the simulation passed.
///
/// # Errors
/// Output failures.
pub fn simulate(
    document: &LabDocument,
    config: SimulatorConfig,
    out: &mut impl Write,
) -> Result<bool> {
    let report = run_simulator(config, document);
    write!(out, "{}", report.generate_text())?;
    Ok(report.passed())
}

/// Simulate the document under several seeds
///
/// # Errors
/// Output failures.
pub fn certify(document: &LabDocument, runs_per_seed: u64, out: &mut impl Write) -> Result<bool> {
    let report = TestHarness::run_certification(document, runs_per_seed);
    writeln!(out, "Certification Report:")?;
    writeln!(out, "  Seeds Tested: {}", report.seeds_tested)?;
    writeln!(out, "  Actions Simulated: {}", report.total_actions)?;
    writeln!(out, "  Total Violations: {}", report.total_violations)?;
    writeln!(
        out,
        "  Status: {}",
        if report.passed { "PASSED" } else { "FAILED" }
    )?;
    Ok(report.passed)
}
