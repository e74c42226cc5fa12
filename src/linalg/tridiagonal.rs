//! Thomas algorithm for tridiagonal systems
//!
//! The Crank–Nicolson particle operator is tridiagonal, so the primary
//! solve is an O(n) elimination on the three bands pulled out of the CSR
//! matrix. Zero pivots are reported rather than divided through.

use std::time::Instant;

use sprs::CsMat;

use super::solver::{SolveFailure, SolveResult, Solver, SolverUtils};

/// Pivots smaller than this are treated as zero
const PIVOT_TOLERANCE: f64 = 1e-300;

/// Solve tridiagonal system Ax = d using the Thomas algorithm.
///
/// - `a`: sub-diagonal \[n\] (a\[0\] unused)
/// - `b`: main diagonal \[n\]
/// - `c`: super-diagonal \[n\] (c\[n-1\] unused)
/// - `d`: right-hand side \[n\]
///
/// Returns the solution vector, or the row whose pivot vanished.
pub fn thomas_solve(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> Result<Vec<f64>, SolveFailure> {
    let n = d.len();
    if n == 0 || a.len() != n || b.len() != n || c.len() != n {
        return Err(SolveFailure::DimensionMismatch {
            rows: b.len(),
            cols: b.len(),
            rhs: n,
        });
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    // Forward sweep
    if b[0].abs() < PIVOT_TOLERANCE {
        return Err(SolveFailure::Singular { row: 0 });
    }
    c_prime[0] = c[0] / b[0];
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let den = b[i] - a[i] * c_prime[i - 1];
        if den.abs() < PIVOT_TOLERANCE {
            return Err(SolveFailure::Singular { row: i });
        }
        if i < n - 1 {
            c_prime[i] = c[i] / den;
        }
        d_prime[i] = (d[i] - a[i] * d_prime[i - 1]) / den;
    }

    // Back substitution
    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(SolveFailure::NonFinite);
    }
    Ok(x)
}

/// Extract the (sub, main, super) diagonals of a CSR matrix
///
/// Fails if any stored entry lies outside the band.
#[allow(non_snake_case)]
pub fn tridiagonal_bands(A: &CsMat<f64>) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), SolveFailure> {
    let n = A.rows();
    let mut sub = vec![0.0; n];
    let mut main = vec![0.0; n];
    let mut sup = vec![0.0; n];

    for (row, vec) in A.outer_iterator().enumerate() {
        for (col, &val) in vec.iter() {
            if col + 1 == row {
                sub[row] = val;
            } else if col == row {
                main[row] = val;
            } else if col == row + 1 {
                sup[row] = val;
            } else {
                return Err(SolveFailure::NotTridiagonal { row, col });
            }
        }
    }
    Ok((sub, main, sup))
}

/// Direct tridiagonal solver
#[derive(Debug, Default, Clone)]
pub struct ThomasSolver;

impl ThomasSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for ThomasSolver {
    #[allow(non_snake_case)]
    fn solve(&mut self, A: &CsMat<f64>, b: &[f64]) -> SolveResult {
        let start = Instant::now();
        SolverUtils::check_dimensions(A, b)?;

        let (sub, main, sup) = tridiagonal_bands(A)?;
        let x = thomas_solve(&sub, &main, &sup, b)?;

        let stats = SolverUtils::direct_stats(A, &x, b, start.elapsed().as_secs_f64());
        Ok((x, stats))
    }

    fn name(&self) -> &str {
        "Thomas (tridiagonal)"
    }
}
