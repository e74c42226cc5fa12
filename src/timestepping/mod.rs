//! Time-stepping strategies for cycling simulations
//!
//! This module provides the adaptive timestep heuristic used by the
//! schedule state machine.

pub mod adaptive;

pub use adaptive::{AdaptiveTimestep, DtContext, DtLimit, DtPolicy};
