//! Fixed-point (Picard) iteration for scalar coupling problems
//!
//! **Problem**: the terminal voltage depends on electrode potentials that are
//! themselves evaluated from the operating point:
//!
//! ```text
//! V = φ_cathode(V) − φ_anode(V) + I·R_ohm
//! ```
//!
//! **Solution**: iterate `V^k = g(V^{k-1})` until consecutive estimates
//! differ by less than the tolerance:
//!
//! ```text
//! Loop k = 1, 2, 3, ...
//!   1. Evaluate: V^k = g(V^{k-1})
//!   2. Check: |V^k - V^{k-1}| < tol → converged
//! ```
//!
//! Hitting the iteration cap is not an error: the last estimate is returned
//! with `converged = false` and a warning is logged.

use tracing::warn;

use crate::error::SimResult;

/// Configuration for fixed-point iteration
#[derive(Debug, Clone, Copy)]
pub struct FixedPointConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,

    /// Convergence tolerance on the absolute change between iterates
    pub tolerance: f64,
}

impl Default for FixedPointConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-4,
        }
    }
}

impl FixedPointConfig {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }
}

/// Statistics from a fixed-point solve
#[derive(Debug, Clone, Copy)]
pub struct FixedPointStats {
    /// Iterations performed
    pub iterations: usize,
    /// Absolute change at the last iteration
    pub last_change: f64,
    /// Whether the tolerance was met
    pub converged: bool,
}

/// Iterate `update` from `initial` until the change drops below tolerance
///
/// # Arguments
/// * `config` - Iteration cap and tolerance
/// * `initial` - Starting estimate
/// * `update` - Map from the previous estimate to the next one
///
/// # Returns
/// Final estimate and statistics. Errors from `update` are propagated
/// immediately. A non-finite estimate stops the iteration so the caller can
/// decide whether it is fatal.
pub fn fixed_point_solve<F>(
    config: &FixedPointConfig,
    initial: f64,
    mut update: F,
) -> SimResult<(f64, FixedPointStats)>
where
    F: FnMut(f64) -> SimResult<f64>,
{
    let mut value = initial;
    let mut stats = FixedPointStats {
        iterations: 0,
        last_change: f64::INFINITY,
        converged: false,
    };

    while stats.iterations < config.max_iterations.max(1) {
        let next = update(value)?;
        stats.iterations += 1;
        stats.last_change = (next - value).abs();
        value = next;

        if !value.is_finite() {
            return Ok((value, stats));
        }
        if stats.last_change < config.tolerance {
            stats.converged = true;
            return Ok((value, stats));
        }
    }

    warn!(
        iterations = stats.iterations,
        change = stats.last_change,
        "fixed-point iteration hit its cap, continuing with last estimate"
    );
    Ok((value, stats))
}
