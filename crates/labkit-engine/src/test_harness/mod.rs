// Test harness module
// Randomized simulation and content certification

pub mod simulator;

pub use simulator::*;

use labkit_model::LabDocument;

/// Seeds used by certification
const CERTIFICATION_SEEDS: u64 = 10;

/// Runs the simulator over many seeds
pub struct TestHarness;

impl TestHarness {
    /// Simulate `document` under several seeds and summarize
    #[must_use]
    pub fn run_certification(document: &LabDocument, runs_per_seed: u64) -> CertificationReport {
        let mut all_passed = true;
        let mut total_violations = 0;
        let mut total_actions = 0;

        for seed in 0..CERTIFICATION_SEEDS {
            let config = SimulatorConfig {
                seed,
                runs: runs_per_seed,
                stop_on_first_violation: false,
                ..Default::default()
            };

            let report = run_simulator(config, document);
            if !report.passed() {
                all_passed = false;
            }
            total_violations += report.violations.len();
            total_actions += report.stats.actions_submitted;
        }

        tracing::info!(
            seeds = CERTIFICATION_SEEDS,
            total_actions,
            total_violations,
            "Certification finished"
        );
        CertificationReport {
            passed: all_passed && total_violations == 0,
            total_violations,
            total_actions,
            seeds_tested: CERTIFICATION_SEEDS,
        }
    }
}

/// Report from certification
#[derive(Debug, Clone)]
pub struct CertificationReport {
    pub passed: bool,
    pub total_violations: usize,
    pub total_actions: u64,
    pub seeds_tested: u64,
}
