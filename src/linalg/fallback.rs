use sprs::CsMat;
use tracing::warn;

use super::dense::DenseInverseSolver;
use super::solver::{Solver, SolverStats};
use super::tridiagonal::ThomasSolver;
use crate::error::{SimError, SimResult};

/// Primary solve with a single fallback
///
/// Runs `primary`; if it reports a [`SolveFailure`](super::SolveFailure)
/// the failure is logged and `fallback` is tried. A second failure is
/// fatal and surfaces as [`SimError::LinAlg`].
#[derive(Debug, Clone, Default)]
pub struct FallbackSolver<P = ThomasSolver, F = DenseInverseSolver> {
    primary: P,
    fallback: F,
    fallbacks_used: usize,
}

impl FallbackSolver {
    /// Thomas elimination backed by a dense inverse
    pub fn tridiagonal() -> Self {
        Self::new(ThomasSolver::new(), DenseInverseSolver::new())
    }
}

impl<P: Solver, F: Solver> FallbackSolver<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            fallbacks_used: 0,
        }
    }

    /// Number of solves that needed the fallback
    pub fn fallbacks_used(&self) -> usize {
        self.fallbacks_used
    }

    #[allow(non_snake_case)]
    pub fn solve(&mut self, A: &CsMat<f64>, b: &[f64]) -> SimResult<(Vec<f64>, SolverStats)> {
        let primary_err = match self.primary.solve(A, b) {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        warn!(
            solver = self.primary.name(),
            error = %primary_err,
            "primary linear solve failed, falling back to {}",
            self.fallback.name()
        );
        self.fallbacks_used += 1;

        self.fallback.solve(A, b).map_err(|fallback_err| {
            SimError::LinAlg(format!(
                "{} failed ({}), {} failed ({})",
                self.primary.name(),
                primary_err,
                self.fallback.name(),
                fallback_err
            ))
        })
    }
}
