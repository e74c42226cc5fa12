//! Linear solve interface used by the particle diffusion step
//!
//! Solvers report failure as a [`SolveFailure`] value so that the caller can
//! choose a fallback instead of unwinding.

use sprs::CsMat;
use thiserror::Error;

/// Residual diagnostics of a direct solve
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// ||b − Ax||
    pub residual_norm: f64,
    /// ||b − Ax|| / ||b||, or the absolute norm for a zero right-hand side
    pub relative_residual: f64,
    pub converged: bool,
    /// Wall time (s)
    pub solve_time: f64,
}

/// Why a linear solve produced no usable solution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveFailure {
    #[error("dimension mismatch: matrix is {rows}x{cols}, rhs has {rhs} entries")]
    DimensionMismatch { rows: usize, cols: usize, rhs: usize },

    #[error("matrix has an entry at ({row}, {col}) outside the tridiagonal band")]
    NotTridiagonal { row: usize, col: usize },

    #[error("singular matrix (zero pivot in row {row})")]
    Singular { row: usize },

    #[error("solution contains non-finite values")]
    NonFinite,
}

/// Solution and residual statistics, or the reason the solve failed
pub type SolveResult = Result<(Vec<f64>, SolverStats), SolveFailure>;

/// Matrix-vector product
pub trait LinearOperator {
    fn apply(&self, v: &[f64]) -> Vec<f64>;
}

impl LinearOperator for CsMat<f64> {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        self.outer_iterator()
            .map(|row| row.iter().map(|(col, &val)| val * v[col]).sum())
            .collect()
    }
}

/// Direct solver for A·x = b
pub trait Solver {
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &CsMat<f64>, b: &[f64]) -> SolveResult;

    fn name(&self) -> &str;
}

/// Shape checks and residual diagnostics shared by the solvers
pub struct SolverUtils;

impl SolverUtils {
    /// Relative residual below which a direct solve counts as converged
    pub const CONVERGED_RESIDUAL: f64 = 1e-8;

    pub fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// ||b − Ax||
    #[allow(non_snake_case)]
    pub fn residual_norm<O: LinearOperator>(A: &O, x: &[f64], b: &[f64]) -> f64 {
        let ax = A.apply(x);
        let r: Vec<f64> = b.iter().zip(&ax).map(|(bi, axi)| bi - axi).collect();
        Self::norm(&r)
    }

    #[allow(non_snake_case)]
    pub fn relative_residual<O: LinearOperator>(A: &O, x: &[f64], b: &[f64]) -> f64 {
        let r = Self::residual_norm(A, x, b);
        let b_norm = Self::norm(b);
        if b_norm < 1e-14 {
            r
        } else {
            r / b_norm
        }
    }

    /// `A` must be square and match the length of `b`
    #[allow(non_snake_case)]
    pub fn check_dimensions(A: &CsMat<f64>, b: &[f64]) -> Result<(), SolveFailure> {
        if A.rows() != A.cols() || A.rows() != b.len() {
            return Err(SolveFailure::DimensionMismatch {
                rows: A.rows(),
                cols: A.cols(),
                rhs: b.len(),
            });
        }
        Ok(())
    }

    #[allow(non_snake_case)]
    pub fn direct_stats(A: &CsMat<f64>, x: &[f64], b: &[f64], solve_time: f64) -> SolverStats {
        let residual_norm = Self::residual_norm(A, x, b);
        let b_norm = Self::norm(b);
        let relative_residual = if b_norm < 1e-14 {
            residual_norm
        } else {
            residual_norm / b_norm
        };
        SolverStats {
            residual_norm,
            relative_residual,
            converged: relative_residual < Self::CONVERGED_RESIDUAL,
            solve_time,
        }
    }
}
