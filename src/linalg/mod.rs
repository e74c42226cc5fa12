pub mod solver;
pub mod tridiagonal;
pub mod dense;
pub mod fallback;
pub mod fixed_point;

pub use solver::{LinearOperator, SolveFailure, SolveResult, Solver, SolverStats, SolverUtils};
pub use tridiagonal::{thomas_solve, ThomasSolver};
pub use dense::DenseInverseSolver;
pub use fallback::FallbackSolver;
pub use fixed_point::{fixed_point_solve, FixedPointConfig, FixedPointStats};
