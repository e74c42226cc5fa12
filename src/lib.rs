pub mod cell;
pub mod config;
pub mod electrode;
pub mod error;
pub mod linalg;
pub mod materials;
pub mod ohmic;
pub mod schedule;
pub mod simulation;
pub mod state;
pub mod timestepping;
pub mod utils;

pub use cell::{CellModel, HeatSources, StepControl, StepInput, StepSolution, ThermalModel, Throughput, ThroughputCounter};
pub use config::{CellConfig, ElectrodeParams, GlobalParams, LayerParams, SeiParams, SimulationParams};
pub use electrode::{Electrode, ElectrodeKind, ParticleDiffusion, SolverMethod};
pub use error::{SimError, SimResult};
pub use linalg::{fixed_point_solve, FallbackSolver, FixedPointConfig, Solver, ThomasSolver};
pub use materials::{Arrhenius, Material};
pub use ohmic::OhmicElement;
pub use schedule::{load_schedule, parse_schedule, OperatingMode, ScheduleStateMachine, Step, StepType, StopObservation, StopType};
pub use simulation::{run_parallel, CycleSummary, NullSink, RunSummary, Sample, SampleSink, SimulationDriver};
pub use state::StepHistory;
pub use timestepping::{AdaptiveTimestep, DtLimit, DtPolicy};
pub use utils::units;
