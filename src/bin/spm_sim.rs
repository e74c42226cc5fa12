//! Run a cell configuration and stream the time series as CSV
//!
//! ```text
//! spm_sim <config.toml> [schedule.txt]
//! ```
//!
//! Samples go to stdout; diagnostics go to stderr and follow `RUST_LOG`
//! (default `info`).

use std::env;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use spm_sim::{load_schedule, CellConfig, Sample, SampleSink, SimResult, SimulationDriver, Throughput};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Writes one CSV row per sample, header first
struct CsvSink<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }
}

impl<W: Write> SampleSink for CsvSink<W> {
    fn record(&mut self, sample: &Sample) -> SimResult<()> {
        if !self.header_written {
            writeln!(self.out, "{}", Sample::CSV_HEADER)?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", sample)?;
        Ok(())
    }

    fn end_cycle(&mut self, _cycle: usize, _totals: &Throughput) -> SimResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn run(config_path: &str, schedule_path: Option<&str>) -> SimResult<()> {
    let mut config = CellConfig::from_file(config_path)?;
    if let Some(path) = schedule_path {
        config.schedule = load_schedule(path)?;
    }
    config.log_summary();

    let mut driver = SimulationDriver::new(&config)?;
    let stdout = io::stdout();
    let mut sink = CsvSink::new(BufWriter::new(stdout.lock()));
    let summary = driver.run(&mut sink)?;
    sink.out.flush()?;

    for cycle in &summary.cycles {
        info!(
            cycle = cycle.cycle,
            discharge_ah = cycle.discharge_ah,
            charge_ah = cycle.charge_ah,
            discharge_wh = cycle.discharge_wh,
            charge_wh = cycle.charge_wh,
            "cycle summary"
        );
    }
    info!(
        steps = summary.steps,
        time_h = summary.total_time / 3600.0,
        final_voltage = summary.final_voltage,
        final_temperature = summary.final_temperature,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: {} <config.toml> [schedule.txt]", args[0]);
        return ExitCode::from(2);
    }

    match run(&args[1], args.get(2).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
