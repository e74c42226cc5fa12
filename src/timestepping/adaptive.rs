//! Adaptive time step selection for cycling
//!
//! The step size follows a heuristic rather than an error estimate. In CC
//! mode it grows slowly while the voltage is quiet and far from the cutoff,
//! and shrinks when the voltage moves fast or nears the step's voltage
//! limit. In CV mode it follows how close the current is to its cutoff.
//! Afterwards a few hard limits apply: small steps right after a step change,
//! the step's `max_dt`, a fraction of a rest period, and an exact landing on
//! time-based stops.

use crate::schedule::{Step, StopType};

/// Constraint that produced the final time step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtLimit {
    /// Quiet voltage, dt grown
    Growth,
    /// Close to the step's voltage cutoff
    VoltageMargin,
    /// Large voltage change over the last step
    VoltageChange,
    /// CV current just below the cutoff current
    CurrentApproach,
    /// CV current at or above the cutoff
    CurrentCutoff,
    /// First iterations of a new step
    StepStart,
    /// Step's configured maximum
    MaxDt,
    /// Fraction of the rest duration
    Rest,
    /// Remaining time of a time-stopped step
    TimeStop,
    /// Set externally
    Forced,
}

/// Selected time step and the constraint that set it
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveTimestep {
    /// Time step for the next solve (s)
    pub dt: f64,
    /// Time step of the step just taken (s)
    pub previous_dt: f64,
    pub limit: DtLimit,
}

impl AdaptiveTimestep {
    /// Check which constraint is limiting the timestep
    pub fn limiting_constraint(&self) -> &'static str {
        match self.limit {
            DtLimit::Growth => "growth",
            DtLimit::VoltageMargin => "voltage margin",
            DtLimit::VoltageChange => "voltage change",
            DtLimit::CurrentApproach => "CV current approach",
            DtLimit::CurrentCutoff => "CV current cutoff",
            DtLimit::StepStart => "step start",
            DtLimit::MaxDt => "max dt",
            DtLimit::Rest => "rest fraction",
            DtLimit::TimeStop => "time stop",
            DtLimit::Forced => "forced",
        }
    }

    /// Ratio of the new time step to the previous one
    pub fn growth_factor(&self) -> f64 {
        if self.previous_dt > 0.0 {
            self.dt / self.previous_dt
        } else {
            1.0
        }
    }
}

/// Tuning constants of the time step heuristic
#[derive(Debug, Clone, Copy)]
pub struct DtPolicy {
    /// Smallest dt reached by shrinking (s)
    pub min_dt: f64,
    /// Multiplier applied while the voltage is quiet and far from cutoff
    pub growth: f64,
    /// Divisor applied near a discharge cutoff or on a large voltage change
    pub fast_shrink: f64,
    /// Divisor applied near a charge cutoff
    pub slow_shrink: f64,
    /// Voltage window around a discharge cutoff (V)
    pub discharge_margin: f64,
    /// Voltage window around a charge cutoff (V)
    pub charge_margin: f64,
    /// Voltage change per step considered large (V)
    pub max_voltage_change: f64,
    /// Relative CV current error below which dt tracks the error
    pub cv_window: f64,
    /// Smallest dt while approaching the CV cutoff (s)
    pub cv_min_dt: f64,
    /// The approach rule only applies after a step longer than this (s)
    pub cv_approach_dt: f64,
    /// dt once the CV current has reached its cutoff (s)
    pub cv_cutoff_dt: f64,
    /// Iterations after a step change that use `start_dt`
    pub start_iterations: usize,
    /// dt used right after a step change (s)
    pub start_dt: f64,
    /// A rest step takes at least this many time steps
    pub rest_divisions: f64,
}

impl Default for DtPolicy {
    fn default() -> Self {
        Self {
            min_dt: 0.1,
            growth: 1.05,
            fast_shrink: 1.5,
            slow_shrink: 1.1,
            discharge_margin: 0.35,
            charge_margin: 0.25,
            max_voltage_change: 0.02,
            cv_window: 0.1,
            cv_min_dt: 0.5,
            cv_approach_dt: 0.4,
            cv_cutoff_dt: 1.0,
            start_iterations: 5,
            start_dt: 0.1,
            rest_divisions: 5.0,
        }
    }
}

/// State of the cycler after an accepted time step
#[derive(Debug, Clone, Copy)]
pub struct DtContext<'a> {
    pub step: &'a Step,
    /// The active step is a CV hold
    pub constant_voltage: bool,
    pub current: f64,
    pub voltage: f64,
    pub last_voltage: f64,
    /// Global CV cutoff current, used when the step has no current stop (A)
    pub cutoff_current: f64,
    pub step_iterations: usize,
    /// Time already spent in the step (s)
    pub step_time: f64,
}

impl DtPolicy {
    /// Next time step after one of length `dt`
    pub fn next_dt(&self, dt: f64, ctx: &DtContext<'_>) -> AdaptiveTimestep {
        let step = ctx.step;
        let (mut next, mut limit) = if ctx.constant_voltage {
            self.constant_voltage_dt(dt, ctx)
        } else {
            self.constant_current_dt(dt, ctx)
        };

        if ctx.step_iterations < self.start_iterations {
            next = self.start_dt;
            limit = DtLimit::StepStart;
        }
        if next > step.max_dt {
            next = step.max_dt;
            limit = DtLimit::MaxDt;
        }
        if step.is_rest() {
            let cap = step.stop_condition / self.rest_divisions;
            if next > cap {
                next = cap;
                limit = DtLimit::Rest;
            }
        }
        if step.stop == StopType::Time && ctx.step_time + next > step.stop_condition {
            next = step.stop_condition - ctx.step_time;
            limit = DtLimit::TimeStop;
        }

        AdaptiveTimestep {
            dt: next,
            previous_dt: dt,
            limit,
        }
    }

    fn constant_current_dt(&self, dt: f64, ctx: &DtContext<'_>) -> (f64, DtLimit) {
        let step = ctx.step;
        if step.stop == StopType::Voltage {
            let gap = (ctx.voltage - step.stop_condition).abs();
            if ctx.current < 0.0 && gap < self.discharge_margin {
                return ((dt / self.fast_shrink).max(self.min_dt), DtLimit::VoltageMargin);
            }
            if ctx.current > 0.0 && gap < self.charge_margin {
                return ((dt / self.slow_shrink).max(self.min_dt), DtLimit::VoltageMargin);
            }
        }

        if (ctx.voltage - ctx.last_voltage).abs() > self.max_voltage_change {
            ((dt / self.fast_shrink).max(self.min_dt), DtLimit::VoltageChange)
        } else {
            (dt * self.growth, DtLimit::Growth)
        }
    }

    fn constant_voltage_dt(&self, dt: f64, ctx: &DtContext<'_>) -> (f64, DtLimit) {
        let step = ctx.step;
        let cutoff = if step.stop == StopType::Current && step.stop_condition != 0.0 {
            step.stop_condition
        } else {
            ctx.cutoff_current
        };
        let error = (cutoff - ctx.current) / cutoff;

        if error < 0.0 && error.abs() < self.cv_window && dt > self.cv_approach_dt {
            (
                (error.abs() * step.max_dt * 2.0).max(self.cv_min_dt),
                DtLimit::CurrentApproach,
            )
        } else if error >= 0.0 {
            (self.cv_cutoff_dt, DtLimit::CurrentCutoff)
        } else {
            (step.max_dt, DtLimit::MaxDt)
        }
    }
}
