//! Time loop coupling a cell to its cycling schedule
//!
//! Each iteration advances the clocks, solves the cell for the schedule's
//! control, emits one [`Sample`], checks the step's stop condition and picks
//! the next time step. Finished cycles are reported to the sink before the
//! cell's throughput counters are reset.

use std::fmt;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::cell::{CellModel, StepInput, Throughput};
use crate::config::CellConfig;
use crate::error::{SimError, SimResult};
use crate::schedule::{ScheduleStateMachine, StopObservation};

/// One row of the output time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub cycle: usize,
    pub step: usize,
    /// Simulated time since the start of the run (s)
    pub total_time: f64,
    /// Time spent in the active step (s)
    pub step_time: f64,
    pub current: f64,
    pub voltage: f64,
    /// Cumulative discharge capacity of the running cycle (A·s)
    pub discharge_capacity: f64,
    /// Cumulative charge capacity of the running cycle (A·s)
    pub charge_capacity: f64,
    pub cathode_soc: f64,
    pub anode_soc: f64,
    /// Cell temperature (K)
    pub temperature: f64,
    /// Volumetric heat generation (W/m³)
    pub heat_generation: f64,
    /// Internal resistance (Ω)
    pub internal_resistance: f64,
}

impl Sample {
    pub const CSV_HEADER: &'static str = "cycle,step,totTime_s,stepTime_s,current_A,voltage_V,\
dischargeCapacity_As,chargeCapacity_As,cathodeSOC,anodeSOC,temperature_K,heatGen_Wm3,Rint_ohm";

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{:.3},{:.3},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.4},{:.6e},{:.6e}",
            self.cycle,
            self.step,
            self.total_time,
            self.step_time,
            self.current,
            self.voltage,
            self.discharge_capacity,
            self.charge_capacity,
            self.cathode_soc,
            self.anode_soc,
            self.temperature,
            self.heat_generation,
            self.internal_resistance
        )
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv_row())
    }
}

/// Throughput of one finished cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleSummary {
    pub cycle: usize,
    pub discharge_ah: f64,
    pub charge_ah: f64,
    pub discharge_wh: f64,
    pub charge_wh: f64,
}

impl CycleSummary {
    pub fn new(cycle: usize, totals: &Throughput) -> Self {
        Self {
            cycle,
            discharge_ah: totals.discharge_ah(),
            charge_ah: totals.charge_ah(),
            discharge_wh: totals.discharge_wh(),
            charge_wh: totals.charge_wh(),
        }
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Accepted time steps
    pub steps: usize,
    pub total_time: f64,
    pub final_voltage: f64,
    pub final_temperature: f64,
    pub cycles: Vec<CycleSummary>,
}

/// Consumer of the time series
pub trait SampleSink {
    fn record(&mut self, sample: &Sample) -> SimResult<()>;

    /// Called once per finished cycle with its totals
    fn end_cycle(&mut self, _cycle: usize, _totals: &Throughput) -> SimResult<()> {
        Ok(())
    }
}

impl SampleSink for Vec<Sample> {
    fn record(&mut self, sample: &Sample) -> SimResult<()> {
        self.push(*sample);
        Ok(())
    }
}

/// Sink that drops every sample
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn record(&mut self, _sample: &Sample) -> SimResult<()> {
        Ok(())
    }
}

/// Cell plus schedule, advanced one accepted time step at a time
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    cell: CellModel,
    schedule: ScheduleStateMachine,
    max_steps: Option<usize>,
    steps: usize,
    cycles: Vec<CycleSummary>,
}

impl SimulationDriver {
    /// Validate the configuration and set up the cell at rest
    pub fn new(config: &CellConfig) -> SimResult<Self> {
        config.validate()?;
        let cell = CellModel::new(config)?;
        let schedule = ScheduleStateMachine::from_config(config)?;
        info!(
            ocv = cell.voltage(),
            mass_kg = cell.mass(),
            volume_m3 = cell.volume(),
            "cell initialised"
        );

        Ok(Self {
            cell,
            schedule,
            max_steps: config.simulation.max_steps,
            steps: 0,
            cycles: Vec::new(),
        })
    }

    pub fn cell(&self) -> &CellModel {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut CellModel {
        &mut self.cell
    }

    pub fn schedule(&self) -> &ScheduleStateMachine {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut ScheduleStateMachine {
        &mut self.schedule
    }

    pub fn is_finished(&self) -> bool {
        self.schedule.is_finished()
    }

    /// Summaries of the cycles finished so far
    pub fn cycles(&self) -> &[CycleSummary] {
        &self.cycles
    }

    /// Take one accepted time step
    pub fn step<S: SampleSink + ?Sized>(&mut self, sink: &mut S) -> SimResult<Sample> {
        if let Some(limit) = self.max_steps {
            if self.steps >= limit {
                return Err(SimError::StepLimitExceeded(limit));
            }
        }

        let last_voltage = self.cell.voltage();
        self.schedule.advance_time();

        let input = StepInput {
            control: self.schedule.control(),
            dt: self.schedule.dt(),
            total_time: self.schedule.total_time(),
            cycle: self.schedule.cycle(),
            new_cycle: self.schedule.starts_new_cycle(),
        };
        let solution = self.cell.solve_step(&input)?;
        self.schedule.set_applied_current(solution.current);
        self.steps += 1;

        let totals = *self.cell.throughput();
        let sample = Sample {
            cycle: self.schedule.cycle(),
            step: self.schedule.step_index(),
            total_time: self.schedule.total_time(),
            step_time: self.schedule.step_time(),
            current: solution.current,
            voltage: solution.voltage,
            discharge_capacity: totals.discharge_capacity,
            charge_capacity: totals.charge_capacity,
            cathode_soc: solution.cathode_soc,
            anode_soc: solution.anode_soc,
            temperature: solution.temperature,
            heat_generation: solution.heat_generation,
            internal_resistance: solution.internal_resistance,
        };
        sink.record(&sample)?;

        let observation = StopObservation {
            voltage: solution.voltage,
            discharge_capacity: totals.discharge_capacity,
            charge_capacity: totals.charge_capacity,
            reference_capacity: self.cell.counters().last_cycle().charge_capacity,
        };
        if self.schedule.check_stop_condition(&observation) {
            self.finish_cycle_if_wrapped(&totals, sink)?;
        }

        let adaptive = self.schedule.set_dt(solution.voltage, last_voltage);
        debug!(
            t = sample.total_time,
            voltage = sample.voltage,
            current = sample.current,
            next_dt = adaptive.dt,
            "step accepted"
        );
        Ok(sample)
    }

    /// Leave the active step now, as a pack balancing driver would
    pub fn force_advance<S: SampleSink + ?Sized>(&mut self, sink: &mut S) -> SimResult<()> {
        self.schedule.force_advance();
        let totals = *self.cell.throughput();
        self.finish_cycle_if_wrapped(&totals, sink)
    }

    fn finish_cycle_if_wrapped<S: SampleSink + ?Sized>(
        &mut self,
        totals: &Throughput,
        sink: &mut S,
    ) -> SimResult<()> {
        if self.schedule.cycle() > self.schedule.last_cycle() {
            let finished = self.schedule.last_cycle();
            let summary = CycleSummary::new(finished, totals);
            info!(
                cycle = finished,
                discharge_ah = summary.discharge_ah,
                charge_ah = summary.charge_ah,
                discharge_wh = summary.discharge_wh,
                charge_wh = summary.charge_wh,
                "cycle finished"
            );
            sink.end_cycle(finished, totals)?;
            self.cycles.push(summary);
        }
        Ok(())
    }

    /// Step until the schedule has run its cycles
    pub fn run<S: SampleSink + ?Sized>(&mut self, sink: &mut S) -> SimResult<RunSummary> {
        while !self.is_finished() {
            self.step(sink)?;
        }

        info!(
            steps = self.steps,
            time_s = self.schedule.total_time(),
            cycles = self.cycles.len(),
            "run complete"
        );
        Ok(RunSummary {
            steps: self.steps,
            total_time: self.schedule.total_time(),
            final_voltage: self.cell.voltage(),
            final_temperature: self.cell.temperature(),
            cycles: self.cycles.clone(),
        })
    }
}

/// Simulate independent cells on the rayon thread pool
///
/// Results keep the order of `configs`; a failing cell does not stop the
/// others.
pub fn run_parallel(configs: &[CellConfig]) -> Vec<SimResult<(RunSummary, Vec<Sample>)>> {
    configs
        .par_iter()
        .map(|config| -> SimResult<(RunSummary, Vec<Sample>)> {
            let mut driver = SimulationDriver::new(config)?;
            let mut samples = Vec::new();
            let summary = driver.run(&mut samples)?;
            Ok((summary, samples))
        })
        .collect()
}
