use std::time::Instant;

use nalgebra::{DMatrix, DVector};
use sprs::CsMat;

use super::solver::{SolveFailure, SolveResult, Solver, SolverUtils};

/// Dense solver through an explicit matrix inverse
///
/// Converts the CSR matrix to an nalgebra `DMatrix` and inverts it. Only
/// sensible for the small particle systems, where it serves as the
/// fallback when the banded solve breaks down.
#[derive(Debug, Default, Clone)]
pub struct DenseInverseSolver;

impl DenseInverseSolver {
    pub fn new() -> Self {
        Self
    }
}

/// Copy a CSR matrix into a dense nalgebra matrix
#[allow(non_snake_case)]
pub fn to_dense(A: &CsMat<f64>) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(A.rows(), A.cols());
    for (i, row) in A.outer_iterator().enumerate() {
        row.iter().for_each(|(j, &v)| m[(i, j)] = v);
    }
    m
}

impl Solver for DenseInverseSolver {
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &CsMat<f64>, b: &[f64]) -> SolveResult {
        let start = Instant::now();
        SolverUtils::check_dimensions(A, b)?;

        let inverse = to_dense(A)
            .try_inverse()
            .ok_or(SolveFailure::Singular { row: 0 })?;
        let x_vec = inverse * DVector::from_column_slice(b);
        let x: Vec<f64> = x_vec.iter().copied().collect();

        if x.iter().any(|v| !v.is_finite()) {
            return Err(SolveFailure::NonFinite);
        }

        let stats = SolverUtils::direct_stats(A, &x, b, start.elapsed().as_secs_f64());
        Ok((x, stats))
    }

    fn name(&self) -> &str {
        "Dense inverse (nalgebra)"
    }
}
