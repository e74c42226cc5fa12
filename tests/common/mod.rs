#![allow(dead_code)]

use spm_sim::{CellConfig, RunSummary, Sample, SimulationDriver, Step};

/// Reference NMC/graphite cell
pub fn fixture() -> CellConfig {
    CellConfig::from_toml_str(include_str!("../../fixtures/nmc_graphite.toml"))
        .expect("fixture parses")
}

/// Fixture cell driven through `steps` once
pub fn single_pass(steps: Vec<Step>) -> CellConfig {
    let mut config = fixture();
    config.schedule = steps;
    config.simulation.max_cycles = 0;
    config
}

pub fn run(config: &CellConfig) -> (SimulationDriver, RunSummary, Vec<Sample>) {
    let mut driver = SimulationDriver::new(config).expect("valid configuration");
    let mut samples: Vec<Sample> = Vec::new();
    let summary = driver.run(&mut samples).expect("run completes");
    (driver, summary, samples)
}
