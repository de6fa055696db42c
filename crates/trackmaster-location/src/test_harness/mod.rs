// Simulation harness
// Seeded platform simulation and invariant checks for tracking sessions

pub mod simulator;

pub use simulator::*;

/// Runs simulations over many seeds
pub struct TestHarness;

impl TestHarness {
    /// Run `seeds` simulations on both backends
    pub async fn run_certification(seeds: u64, readings: u64) -> CertificationReport {
        let mut total_violations = 0;
        let mut runs = 0;

        for seed in 0..seeds {
            for native in [false, true] {
                let config = SimulationConfig {
                    seed,
                    readings,
                    native,
                    ..Default::default()
                };
                let report = run_simulation(config).await;
                total_violations += report.violations.len();
                runs += 1;
            }
        }

        CertificationReport {
            passed: total_violations == 0,
            total_violations,
            runs,
        }
    }
}

/// Report from certification
#[derive(Debug, Clone, serde::Serialize)]
pub struct CertificationReport {
    pub passed: bool,
    pub total_violations: usize,
    pub runs: u64,
}
