pub mod capacity;
pub mod cv;
pub mod model;
pub mod thermal;

pub use capacity::{trapezoid, Throughput, ThroughputCounter};
pub use cv::{CvOutcome, CvSearch};
pub use model::{CellModel, StepControl, StepInput, StepSolution};
pub use thermal::{CoolantLoop, HeatSources, ThermalModel};
