//! Cycling schedules
//!
//! A schedule is an ordered list of CC/CV [`Step`]s that repeats until the
//! configured number of cycles has run. [`ScheduleStateMachine`] tracks the
//! position in it and picks the time step.

pub mod machine;
pub mod step;

pub use machine::{OperatingMode, ScheduleStateMachine, StopObservation};
pub use step::{load_schedule, parse_schedule, Step, StepType, StopType};
