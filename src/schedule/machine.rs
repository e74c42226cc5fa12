//! Step and cycle bookkeeping for a cycling schedule
//!
//! The machine owns the schedule position, elapsed times, applied current
//! and time step. The cell sees it only through [`StepControl`] going in
//! and an observed voltage/capacity coming back.

use tracing::{debug, info};

use super::step::{Step, StepType, StopType};
use crate::cell::StepControl;
use crate::config::CellConfig;
use crate::error::{SimError, SimResult};
use crate::state::StepHistory;
use crate::timestepping::{AdaptiveTimestep, DtContext, DtLimit, DtPolicy};

/// Tolerance on time-based stops (s)
const TIME_STOP_TOLERANCE: f64 = 1e-9;

/// How the applied current is determined in the active step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    ConstantCurrent,
    ConstantVoltage,
}

/// Cell quantities a stop condition can look at
#[derive(Debug, Clone, Copy, Default)]
pub struct StopObservation {
    pub voltage: f64,
    /// Discharge capacity of the running cycle (A·s)
    pub discharge_capacity: f64,
    /// Charge capacity of the running cycle (A·s)
    pub charge_capacity: f64,
    /// Charge capacity of the previous cycle, the depth-of-discharge basis (A·s)
    pub reference_capacity: f64,
}

/// Position in a cycling schedule
#[derive(Debug, Clone)]
pub struct ScheduleStateMachine {
    steps: Vec<Step>,
    step: usize,
    cycle: usize,
    last_cycle: usize,
    max_cycles: usize,
    step_time: f64,
    total_time: f64,
    iterations: usize,
    step_iterations: usize,
    current: StepHistory<f64>,
    mode: OperatingMode,
    dt: f64,
    cutoff_current: f64,
    policy: DtPolicy,
}

impl ScheduleStateMachine {
    /// Start at step 0 of cycle 0
    ///
    /// # Arguments
    /// * `steps` - Ordered schedule, at least one step
    /// * `max_cycles` - The run is finished once the cycle counter exceeds this
    /// * `initial_dt` - First time step (s)
    /// * `cutoff_current` - CV cutoff for steps without a current stop (A)
    pub fn new(
        steps: Vec<Step>,
        max_cycles: usize,
        initial_dt: f64,
        cutoff_current: f64,
    ) -> SimResult<Self> {
        let first = *steps
            .first()
            .ok_or_else(|| SimError::Config("schedule has no steps".into()))?;
        let (mode, current) = match first.step_type {
            StepType::Cc => (OperatingMode::ConstantCurrent, first.condition),
            StepType::Cv => (OperatingMode::ConstantVoltage, 0.0),
        };

        Ok(Self {
            steps,
            step: 0,
            cycle: 0,
            last_cycle: 0,
            max_cycles,
            step_time: 0.0,
            total_time: 0.0,
            iterations: 0,
            step_iterations: 0,
            current: StepHistory::new(current),
            mode,
            dt: initial_dt,
            cutoff_current,
            policy: DtPolicy::default(),
        })
    }

    pub fn from_config(config: &CellConfig) -> SimResult<Self> {
        Self::new(
            config.schedule.clone(),
            config.simulation.max_cycles,
            config.simulation.initial_dt,
            config.global.i_cutoff,
        )
    }

    pub fn with_policy(mut self, policy: DtPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Move the clocks forward by the current time step
    pub fn advance_time(&mut self) {
        self.step_time += self.dt;
        self.total_time += self.dt;
    }

    /// Control handed to the cell for the next solve
    pub fn control(&self) -> StepControl {
        let current = *self.current.present();
        match self.mode {
            OperatingMode::ConstantCurrent => StepControl::ConstantCurrent(current),
            OperatingMode::ConstantVoltage => StepControl::ConstantVoltage {
                target: self.active_step().condition,
                initial_current: current,
            },
        }
    }

    /// Record the current the cell settled on (the CV search result)
    pub fn set_applied_current(&mut self, current: f64) {
        self.current.set(current);
    }

    /// First time step of a cycle
    pub fn starts_new_cycle(&self) -> bool {
        self.step == 0 && self.step_iterations == 0
    }

    /// Count the accepted time step and advance if its stop condition holds
    ///
    /// Returns `true` when the schedule moved to the next step.
    pub fn check_stop_condition(&mut self, observation: &StopObservation) -> bool {
        self.last_cycle = self.cycle;
        self.iterations += 1;
        self.step_iterations += 1;
        self.current.commit_step();

        if self.stop_condition_met(observation) {
            self.advance_step();
            true
        } else {
            false
        }
    }

    fn stop_condition_met(&self, obs: &StopObservation) -> bool {
        let step = self.active_step();
        let current = *self.current.present();
        let threshold = step.stop_condition;
        let active_capacity = if current < 0.0 {
            obs.discharge_capacity
        } else if current > 0.0 {
            obs.charge_capacity
        } else {
            0.0
        };

        match step.stop {
            StopType::Voltage => {
                (current < 0.0 && obs.voltage <= threshold)
                    || (current > 0.0 && obs.voltage >= threshold)
            }
            StopType::Time => self.step_time >= threshold - TIME_STOP_TOLERANCE,
            StopType::Current => current <= threshold,
            StopType::DepthOfDischarge => {
                obs.reference_capacity > 0.0
                    && active_capacity / obs.reference_capacity >= threshold
            }
            StopType::Capacity => active_capacity >= threshold,
        }
    }

    /// Move to the next step, wrapping into a new cycle after the last one
    pub fn advance_step(&mut self) {
        let finished = self.step;
        self.step = (self.step + 1) % self.steps.len();
        if self.step == 0 {
            self.cycle += 1;
        }
        self.step_iterations = 0;
        self.step_time = 0.0;

        let next = *self.active_step();
        match next.step_type {
            StepType::Cc => {
                self.mode = OperatingMode::ConstantCurrent;
                self.current.set(next.condition);
            }
            StepType::Cv => self.mode = OperatingMode::ConstantVoltage,
        }

        info!(
            finished,
            step = self.step,
            cycle = self.cycle,
            mode = %next.step_type,
            condition = next.condition,
            stop = %next.stop,
            time_s = self.total_time,
            "schedule step change"
        );
    }

    /// Leave the active step regardless of its stop condition
    pub fn force_advance(&mut self) {
        self.last_cycle = self.cycle;
        self.advance_step();
    }

    /// Select the time step following an accepted step with `voltage`
    pub fn set_dt(&mut self, voltage: f64, last_voltage: f64) -> AdaptiveTimestep {
        let step = self.active_step();
        let ctx = DtContext {
            step,
            constant_voltage: self.mode == OperatingMode::ConstantVoltage,
            current: *self.current.present(),
            voltage,
            last_voltage,
            cutoff_current: self.cutoff_current,
            step_iterations: self.step_iterations,
            step_time: self.step_time,
        };
        let adaptive = self.policy.next_dt(self.dt, &ctx);
        debug!(
            dt = adaptive.dt,
            limit = adaptive.limiting_constraint(),
            "time step"
        );
        self.dt = adaptive.dt;
        adaptive
    }

    /// Override the next time step
    pub fn force_dt(&mut self, dt: f64) -> AdaptiveTimestep {
        let previous_dt = self.dt;
        self.dt = dt;
        AdaptiveTimestep {
            dt,
            previous_dt,
            limit: DtLimit::Forced,
        }
    }

    /// The cycle counter has passed the configured number of cycles
    pub fn is_finished(&self) -> bool {
        self.cycle > self.max_cycles
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn active_step(&self) -> &Step {
        &self.steps[self.step]
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Cycle of the last accepted time step
    pub fn last_cycle(&self) -> usize {
        self.last_cycle
    }

    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn applied_current(&self) -> f64 {
        *self.current.present()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn step_time(&self) -> f64 {
        self.step_time
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Accepted time steps since the start of the run
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Accepted time steps since the start of the active step
    pub fn step_iterations(&self) -> usize {
        self.step_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cccv() -> Vec<Step> {
        vec![
            Step::cc(1.5, StopType::Voltage, 4.2, 5.0),
            Step::cv(4.2, StopType::Current, 0.1, 10.0),
            Step::cc(0.0, StopType::Time, 100.0, 60.0),
        ]
    }

    fn observe(voltage: f64) -> StopObservation {
        StopObservation {
            voltage,
            ..StopObservation::default()
        }
    }

    #[test]
    fn test_empty_schedule_is_rejected() {
        assert!(ScheduleStateMachine::new(Vec::new(), 1, 0.1, 0.1).is_err());
    }

    #[test]
    fn test_initial_state() {
        let m = ScheduleStateMachine::new(cccv(), 2, 0.1, 0.1).unwrap();
        assert_eq!(m.control(), StepControl::ConstantCurrent(1.5));
        assert!(m.starts_new_cycle());
        assert_eq!(m.cycle(), 0);

        let cv_first =
            ScheduleStateMachine::new(vec![Step::cv(4.2, StopType::Current, 0.1, 1.0)], 0, 0.1, 0.1)
                .unwrap();
        assert_eq!(cv_first.applied_current(), 0.0);
        assert_eq!(cv_first.mode(), OperatingMode::ConstantVoltage);
    }

    #[test]
    fn test_voltage_stop_switches_to_cv() {
        let mut m = ScheduleStateMachine::new(cccv(), 2, 0.1, 0.1).unwrap();
        m.advance_time();
        assert!(!m.check_stop_condition(&observe(4.1)));
        assert!(!m.starts_new_cycle());
        m.advance_time();
        assert!(m.check_stop_condition(&observe(4.2)));
        assert_eq!(m.step_index(), 1);
        assert_eq!(m.step_time(), 0.0);
        assert_eq!(
            m.control(),
            StepControl::ConstantVoltage {
                target: 4.2,
                initial_current: 1.5
            }
        );
    }

    #[test]
    fn test_current_stop_and_cycle_wrap() {
        let mut m = ScheduleStateMachine::new(cccv(), 0, 0.1, 0.1).unwrap();
        m.force_advance();
        m.set_applied_current(0.5);
        assert!(!m.check_stop_condition(&observe(4.2)));
        m.set_applied_current(0.09);
        assert!(m.check_stop_condition(&observe(4.2)));
        assert_eq!(m.applied_current(), 0.0);

        m.force_dt(60.0);
        m.advance_time();
        assert!(!m.check_stop_condition(&observe(4.1)));
        m.force_dt(40.0);
        m.advance_time();
        assert!(m.check_stop_condition(&observe(4.1)));

        assert_eq!(m.step_index(), 0);
        assert_eq!(m.cycle(), 1);
        assert_eq!(m.last_cycle(), 0);
        assert!(m.starts_new_cycle());
        assert!(m.is_finished());
    }

    #[test]
    fn test_voltage_stop_needs_matching_current_sign() {
        let steps = vec![Step::cc(-1.0, StopType::Voltage, 3.0, 2.0)];
        let mut m = ScheduleStateMachine::new(steps, 0, 0.1, 0.1).unwrap();
        assert!(!m.check_stop_condition(&observe(3.2)));
        assert!(m.check_stop_condition(&observe(2.99)));
        assert_eq!(m.cycle(), 1);
    }

    #[test]
    fn test_dod_and_capacity_stops() {
        let steps = vec![
            Step::cc(-1.0, StopType::DepthOfDischarge, 0.5, 2.0),
            Step::cc(1.0, StopType::Capacity, 3600.0, 2.0),
        ];
        let mut m = ScheduleStateMachine::new(steps, 5, 0.1, 0.1).unwrap();

        // No reference cycle yet
        let mut obs = StopObservation {
            voltage: 3.7,
            discharge_capacity: 5000.0,
            charge_capacity: 0.0,
            reference_capacity: 0.0,
        };
        assert!(!m.check_stop_condition(&obs));

        obs.reference_capacity = 7200.0;
        obs.discharge_capacity = 3500.0;
        assert!(!m.check_stop_condition(&obs));
        obs.discharge_capacity = 3600.0;
        assert!(m.check_stop_condition(&obs));

        obs.charge_capacity = 3599.0;
        assert!(!m.check_stop_condition(&obs));
        obs.charge_capacity = 3600.0;
        assert!(m.check_stop_condition(&obs));
        assert_eq!(m.cycle(), 1);
    }

    #[test]
    fn test_time_stop_lands_exactly() {
        let steps = vec![Step::cc(0.0, StopType::Time, 100.0, 60.0)];
        let mut m = ScheduleStateMachine::new(steps, 0, 0.1, 0.1).unwrap();
        let mut last_dt = 0.0;
        let mut guard = 0;
        while !m.is_finished() {
            m.advance_time();
            if m.check_stop_condition(&observe(3.7)) {
                break;
            }
            last_dt = m.set_dt(3.7, 3.7).dt;
            assert!(last_dt <= 20.0 + 1e-12);
            guard += 1;
            assert!(guard < 1000);
        }
        assert!(last_dt > 0.0);
        assert!((m.total_time() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_dt_respects_step_start() {
        let mut m = ScheduleStateMachine::new(cccv(), 1, 1.0, 0.1).unwrap();
        m.advance_time();
        m.check_stop_condition(&observe(3.9));
        let dt = m.set_dt(3.9, 3.9);
        assert_eq!(dt.dt, 0.1);
        assert_eq!(dt.limit, DtLimit::StepStart);
        assert_eq!(m.dt(), 0.1);
    }
}
