/// CC/CV cycling benchmark
///
/// Purpose: Compare the finite-difference and polynomial particle solvers on
/// the reference NMC/graphite cell, and measure pack-style parallel runs.
///
/// Schedule (per cycle): 1 A discharge to 3.0 V, 10 min rest, 1 A charge to
/// 4.2 V, CV hold until 0.1 A, 10 min rest.

use std::time::Instant;

use spm_sim::*;

fn run_case(label: &str, config: &CellConfig) -> Option<RunSummary> {
    println!("--- {} ---", label);
    let start = Instant::now();
    let mut driver = match SimulationDriver::new(config) {
        Ok(d) => d,
        Err(e) => {
            println!("  setup failed: {}", e);
            return None;
        }
    };
    let mut samples: Vec<Sample> = Vec::new();
    let summary = match driver.run(&mut samples) {
        Ok(s) => s,
        Err(e) => {
            println!("  run failed: {}", e);
            return None;
        }
    };
    let elapsed = start.elapsed();

    println!("  Time steps:      {}", summary.steps);
    println!("  Simulated time:  {:.2} h", summary.total_time / 3600.0);
    println!("  Wall time:       {:?}", elapsed);
    println!(
        "  Steps/second:    {:.0}",
        summary.steps as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    println!("  Final voltage:   {:.4} V", summary.final_voltage);
    for cycle in &summary.cycles {
        println!(
            "  cycle {:>2}: discharge {:.4} Ah / {:.3} Wh, charge {:.4} Ah / {:.3} Wh",
            cycle.cycle, cycle.discharge_ah, cycle.discharge_wh, cycle.charge_ah, cycle.charge_wh
        );
    }

    let v_min = samples.iter().map(|s| s.voltage).fold(f64::INFINITY, f64::min);
    let v_max = samples.iter().map(|s| s.voltage).fold(f64::NEG_INFINITY, f64::max);
    println!("  Voltage range:   {:.4} .. {:.4} V\n", v_min, v_max);
    Some(summary)
}

fn main() {
    println!("═══════════════════════════════════════════════════════════════");
    println!("  CC/CV CYCLING: finite difference vs polynomial approximation");
    println!("═══════════════════════════════════════════════════════════════\n");

    let config_path = "fixtures/nmc_graphite.toml";
    let mut base = match CellConfig::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path, e);
            std::process::exit(1);
        }
    };
    base.simulation.max_cycles = 1;
    println!("Loaded config: {}", config_path);
    println!("Schedule: {} steps, {} cycles\n", base.schedule.len(), base.simulation.max_cycles + 1);

    let mut fd = base.clone();
    fd.positive.solver = SolverMethod::FiniteDifference;
    fd.negative.solver = SolverMethod::FiniteDifference;
    let fd_summary = run_case("Crank-Nicolson (fd)", &fd);

    let mut pa = base.clone();
    pa.positive.solver = SolverMethod::PolynomialApproximation;
    pa.negative.solver = SolverMethod::PolynomialApproximation;
    let pa_summary = run_case("Polynomial approximation (pa)", &pa);

    if let (Some(fd), Some(pa)) = (fd_summary, pa_summary) {
        if let (Some(a), Some(b)) = (fd.cycles.first(), pa.cycles.first()) {
            let diff = (a.discharge_ah - b.discharge_ah).abs() / a.discharge_ah.max(1e-12);
            println!("First-cycle discharge capacity difference fd/pa: {:.3} %\n", 100.0 * diff);
        }
    }

    // Pack study: cells differing in initial temperature, run in parallel
    println!("--- Parallel pack (8 cells, 288-302 K) ---");
    let cells: Vec<CellConfig> = (0..8)
        .map(|i| {
            let mut c = base.clone();
            c.global.temperature = 288.15 + 2.0 * i as f64;
            c
        })
        .collect();

    let start = Instant::now();
    let results = run_parallel(&cells);
    let elapsed = start.elapsed();
    println!("  Wall time: {:?} ({} threads)", elapsed, rayon::current_num_threads());
    for (config, result) in cells.iter().zip(&results) {
        match result {
            Ok((summary, _)) => {
                let capacity = summary.cycles.first().map(|c| c.discharge_ah).unwrap_or(0.0);
                println!(
                    "  T0 = {:.2} K: {} steps, first discharge {:.4} Ah",
                    config.global.temperature, summary.steps, capacity
                );
            }
            Err(e) => println!("  T0 = {:.2} K: failed ({})", config.global.temperature, e),
        }
    }

    println!("\n=== Benchmark Complete ===");
}
