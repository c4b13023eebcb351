//! Lab simulator
//!
//! Replays seeded random learner behaviour against a document's procedures
//! and question banks, checking after every action:
//! - accepted actions advance exactly one step and complete on the last one
//! - rejected actions leave the run state untouched
//! - the verdict agrees with an independent reading of the step criteria
//! - free-play accepts everything
//! - quiz scores stay within bounds, equal the correct-answer count, and do
//!   not move when a question is answered twice

use crate::action::Action;
use crate::assessment::AssessmentAttempt;
use crate::matcher::match_step;
use crate::runner::{ProcedureRunner, RunPhase};
use labkit_model::{Assessment, Criteria, LabDocument, Procedure, ProcedureId, ResourceId, ToolId};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Mistakes allowed on one step before the simulated learner gets it right
const MAX_MISTAKES_PER_STEP: u32 = 3;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Procedure runs to simulate
    pub runs: u64,
    /// Stop conditions
    pub stop_on_first_violation: bool,
    /// Probability of a wrong action, clamped to `0.0..=0.9`
    pub mistake_rate: f64,
    /// Free-play actions per run
    pub free_play_actions: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            runs: 1000,
            stop_on_first_violation: true,
            mistake_rate: 0.3,
            free_play_actions: 5,
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Matcher verdict disagrees with the step criteria
    WrongVerdict {
        procedure: ProcedureId,
        step_index: usize,
        action: Action,
        expected_accept: bool,
    },
    /// Accepted action did not advance exactly one step
    NonMonotonicProgress {
        procedure: ProcedureId,
        from: RunPhase,
        to: RunPhase,
    },
    /// Rejected action changed run state
    RejectionMutated {
        procedure: ProcedureId,
        step_index: usize,
        action: Action,
    },
    /// Run never reached completion
    Incomplete { procedure: ProcedureId },
    /// Resource log differs from the procedure's resource steps
    ResourceLogMismatch {
        procedure: ProcedureId,
        expected: Vec<ResourceId>,
        actual: Vec<ResourceId>,
    },
    /// Free-play rejected an action
    FreePlayRejected { action: Action },
    /// Quiz score outside `0..=total` or not equal to the correct count
    ScoreMismatch {
        procedure: ProcedureId,
        expected: usize,
        actual: usize,
        total: usize,
    },
    /// A second answer to the same question changed the score
    ReanswerChangedScore {
        procedure: ProcedureId,
        question: usize,
        before: usize,
        after: usize,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    pub runs: u64,
    pub actions_submitted: u64,
    pub actions_accepted: u64,
    pub actions_rejected: u64,
    pub completions: u64,
    pub free_play_actions: u64,
    pub questions_answered: u64,
    pub reanswers_refused: u64,
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        use std::fmt::Write as _;

        let mut report = String::new();
        let stats = &self.stats;
        let _ = writeln!(report, "=== Lab Simulator Report ===\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Runs: {}", stats.runs);
        let _ = writeln!(report, "Actions Submitted: {}", stats.actions_submitted);
        let _ = writeln!(report, "Actions Accepted: {}", stats.actions_accepted);
        let _ = writeln!(report, "Actions Rejected: {}", stats.actions_rejected);
        let _ = writeln!(report, "Completions: {}", stats.completions);
        let _ = writeln!(report, "Free-play Actions: {}", stats.free_play_actions);
        let _ = writeln!(report, "Questions Answered: {}", stats.questions_answered);
        let _ = writeln!(report, "Re-answers Refused: {}", stats.reanswers_refused);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// Run the simulator against every procedure in `document`
#[must_use]
pub fn run_simulator(config: SimulatorConfig, document: &LabDocument) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    let procedures: Vec<&Procedure> = document.procedures().collect();
    let mistake_rate = config.mistake_rate.clamp(0.0, 0.9);
    tracing::debug!(
        seed = config.seed,
        runs = config.runs,
        procedures = procedures.len(),
        "Simulator started"
    );

    for _ in 0..config.runs {
        let Some(procedure) = procedures.choose(&mut rng) else {
            break;
        };
        stats.runs += 1;

        let pool = ActionPool::new(document, procedure);
        simulate_run(procedure, &pool, mistake_rate, &mut rng, &mut stats, &mut violations);
        simulate_free_play(&pool, config.free_play_actions, &mut rng, &mut stats, &mut violations);
        if let Some(assessment) = document.assessment(procedure.id().as_str()) {
            simulate_quiz(assessment, &mut rng, &mut stats, &mut violations);
        }

        if config.stop_on_first_violation && !violations.is_empty() {
            break;
        }
    }

    tracing::info!(
        seed = config.seed,
        runs = stats.runs,
        violations = violations.len(),
        "Simulator finished"
    );
    SimulatorReport {
        config,
        stats,
        violations,
    }
}

/// Actions a learner could plausibly try at the bench
struct ActionPool {
    tools: Vec<ToolId>,
    resources: Vec<ResourceId>,
}

impl ActionPool {
    fn new(document: &LabDocument, procedure: &Procedure) -> Self {
        let mut tools: Vec<ToolId> = document.catalog().tools().map(|t| t.id.clone()).collect();
        tools.extend(procedure.required_tools().iter().cloned());
        tools.sort();
        tools.dedup();

        let mut resources: Vec<ResourceId> =
            document.catalog().resources().map(|r| r.id.clone()).collect();
        resources.extend(procedure.required_resources().iter().cloned());
        resources.sort();
        resources.dedup();

        Self { tools, resources }
    }

    fn random(&self, rng: &mut StdRng) -> Action {
        match rng.gen_range(0..4) {
            0 => self
                .tools
                .choose(rng)
                .map_or(Action::Observe, |t| Action::select_tool(t.clone())),
            1 => self
                .resources
                .choose(rng)
                .map_or(Action::ApplyHeat, |r| Action::add_resource(r.clone())),
            2 => Action::Observe,
            _ => Action::ApplyHeat,
        }
    }
}

/// The action that satisfies `criteria`
fn expected_action(criteria: &Criteria) -> Action {
    match criteria {
        Criteria::SelectTool { tool_id } => Action::select_tool(tool_id.clone()),
        Criteria::AddResource { resource_id } => Action::add_resource(resource_id.clone()),
        Criteria::Observe => Action::Observe,
        Criteria::ApplyHeat => Action::ApplyHeat,
    }
}

fn simulate_run(
    procedure: &Procedure,
    pool: &ActionPool,
    mistake_rate: f64,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) {
    let mut runner = ProcedureRunner::new(procedure.clone());
    runner.start();

    let mut mistakes = 0;
    let budget = procedure.step_count() * (MAX_MISTAKES_PER_STEP as usize + 1);
    for _ in 0..budget {
        let Some(step) = runner.current_step() else {
            break;
        };
        let correct = expected_action(&step.criteria);
        let action = if mistakes < MAX_MISTAKES_PER_STEP && rng.gen_bool(mistake_rate) {
            pool.random(rng)
        } else {
            correct.clone()
        };
        let expected_accept = action == correct;

        let before_phase = runner.phase();
        let before_log = runner.resource_log().to_vec();
        let before_tool = runner.selected_tool().cloned();
        let step_index = runner.current_step_index().unwrap_or_default();

        let outcome = runner.submit(&action);
        stats.actions_submitted += 1;

        if outcome.result.is_accepted() != expected_accept {
            violations.push(Violation::WrongVerdict {
                procedure: procedure.id().clone(),
                step_index,
                action: action.clone(),
                expected_accept,
            });
        }

        if outcome.result.is_accepted() {
            stats.actions_accepted += 1;
            mistakes = 0;
            let expected_phase = if procedure.is_final_step(step_index) {
                RunPhase::Complete
            } else {
                RunPhase::Running {
                    step_index: step_index + 1,
                }
            };
            if runner.phase() != expected_phase {
                violations.push(Violation::NonMonotonicProgress {
                    procedure: procedure.id().clone(),
                    from: before_phase,
                    to: runner.phase(),
                });
            }
        } else {
            stats.actions_rejected += 1;
            mistakes += 1;
            if runner.phase() != before_phase
                || runner.resource_log() != before_log.as_slice()
                || runner.selected_tool() != before_tool.as_ref()
            {
                violations.push(Violation::RejectionMutated {
                    procedure: procedure.id().clone(),
                    step_index,
                    action,
                });
            }
        }
    }

    if !runner.is_complete() {
        violations.push(Violation::Incomplete {
            procedure: procedure.id().clone(),
        });
        return;
    }
    stats.completions += 1;

    let expected: Vec<ResourceId> = procedure.resource_sequence().cloned().collect();
    if runner.resource_log() != expected.as_slice() {
        violations.push(Violation::ResourceLogMismatch {
            procedure: procedure.id().clone(),
            expected,
            actual: runner.resource_log().to_vec(),
        });
    }
}

fn simulate_free_play(
    pool: &ActionPool,
    count: usize,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) {
    for _ in 0..count {
        let action = pool.random(rng);
        stats.free_play_actions += 1;
        if !match_step(&action, None).is_accepted() {
            violations.push(Violation::FreePlayRejected { action });
        }
    }
}

fn simulate_quiz(
    assessment: &Assessment,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) {
    let procedure = assessment.procedure_id().clone();
    let total = assessment.question_count();
    let mut attempt = AssessmentAttempt::start(assessment.clone());
    let mut expected = 0;

    for (index, question) in assessment.questions().iter().enumerate() {
        let option = rng.gen_range(0..question.options.len());
        if attempt.answer(index, option).is_ok() {
            stats.questions_answered += 1;
            if question.is_correct(option) {
                expected += 1;
            }
        }

        // Re-answering panics under strict-debug, so only probe it otherwise
        if cfg!(not(feature = "strict-debug")) && rng.gen_bool(0.3) {
            let before = attempt.score();
            let again = rng.gen_range(0..question.options.len());
            if attempt.answer(index, again).is_err() {
                stats.reanswers_refused += 1;
            }
            if attempt.score() != before {
                violations.push(Violation::ReanswerChangedScore {
                    procedure: procedure.clone(),
                    question: index,
                    before,
                    after: attempt.score(),
                });
            }
        }
    }

    let actual = attempt.score();
    if actual != expected || actual > total {
        violations.push(Violation::ScoreMismatch {
            procedure,
            expected,
            actual,
            total,
        });
    }
}
