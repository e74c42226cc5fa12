//! Lithium diffusion inside a spherical active-material particle
//!
//! The particle is described on a normalised radius r ∈ [0, 1] by its local
//! state of charge. Two interchangeable strategies are available:
//!
//! - **Crank–Nicolson** on [`GRID_POINTS`] uniformly spaced nodes. The
//!   operator is the spherical Laplacian `c'' + (2/r)·c'` with a mirrored
//!   node at the centre and a Faraday flux source at the surface:
//!
//!   ```text
//!   (I − dt/2·K·L)·x_new = (I + dt/2·K·L)·x_old + dt·F,    K = D/Rp²
//!   ```
//!
//! - **Polynomial approximation**: average concentration from the
//!   time-integrated surface flux, surface concentration from a quasi-steady
//!   parabolic profile correction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

use crate::error::{SimError, SimResult};
use crate::linalg::{FallbackSolver, LinearOperator};
use crate::state::StepHistory;
use crate::utils::units::FARADAY;

/// Number of radial nodes in the finite-difference particle
pub const GRID_POINTS: usize = 25;

/// Particle diffusion strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SolverMethod {
    /// Crank–Nicolson finite differences ("fd")
    #[default]
    FiniteDifference,
    /// Polynomial approximation ("pa")
    PolynomialApproximation,
}

impl SolverMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverMethod::FiniteDifference => "fd",
            SolverMethod::PolynomialApproximation => "pa",
        }
    }
}

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverMethod {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fd" | "finite difference" | "finite_difference" => Ok(SolverMethod::FiniteDifference),
            "pa" | "polynomial approximation" | "polynomial_approximation" => {
                Ok(SolverMethod::PolynomialApproximation)
            }
            other => Err(SimError::UnsupportedSolver(other.to_string())),
        }
    }
}

impl TryFrom<String> for SolverMethod {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SolverMethod> for String {
    fn from(method: SolverMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Inputs of one particle update
#[derive(Debug, Clone, Copy)]
pub struct DiffusionInput {
    /// Intercalation current density at the surface (A/m²)
    pub current_density: f64,
    /// Intercalation current density at the last accepted step (A/m²)
    pub last_current_density: f64,
    /// Temperature-corrected solid diffusivity (m²/s)
    pub diffusivity: f64,
    /// Time step (s)
    pub dt: f64,
    /// Simulated time at the end of this step (s)
    pub total_time: f64,
}

/// Spherical particle diffusion, one variant per strategy
#[derive(Debug, Clone)]
pub enum ParticleDiffusion {
    CrankNicolson(CrankNicolson),
    PolynomialApproximation(PolynomialApproximation),
}

impl ParticleDiffusion {
    /// Uniform particle at `soc0`
    pub fn new(method: SolverMethod, soc0: f64, radius: f64, cmax: f64) -> Self {
        match method {
            SolverMethod::FiniteDifference => {
                ParticleDiffusion::CrankNicolson(CrankNicolson::new(soc0, radius, cmax, GRID_POINTS))
            }
            SolverMethod::PolynomialApproximation => ParticleDiffusion::PolynomialApproximation(
                PolynomialApproximation::new(soc0, radius, cmax),
            ),
        }
    }

    pub fn method(&self) -> SolverMethod {
        match self {
            ParticleDiffusion::CrankNicolson(_) => SolverMethod::FiniteDifference,
            ParticleDiffusion::PolynomialApproximation(_) => SolverMethod::PolynomialApproximation,
        }
    }

    /// Advance from the last accepted state and return the surface SOC
    pub fn advance(&mut self, input: &DiffusionInput) -> SimResult<f64> {
        match self {
            ParticleDiffusion::CrankNicolson(cn) => cn.advance(input),
            ParticleDiffusion::PolynomialApproximation(pa) => Ok(pa.advance(input)),
        }
    }

    /// Surface SOC of the present evaluation
    pub fn surface_soc(&self) -> f64 {
        match self {
            ParticleDiffusion::CrankNicolson(cn) => cn.surface_soc(),
            ParticleDiffusion::PolynomialApproximation(pa) => *pa.surface.present(),
        }
    }

    /// Volume-averaged SOC of the present evaluation
    pub fn average_soc(&self) -> f64 {
        match self {
            ParticleDiffusion::CrankNicolson(cn) => cn.average_soc(),
            ParticleDiffusion::PolynomialApproximation(pa) => pa.average_soc(),
        }
    }

    /// Radial SOC profile, if the strategy resolves one
    pub fn profile(&self) -> Option<&[f64]> {
        match self {
            ParticleDiffusion::CrankNicolson(cn) => Some(cn.profile()),
            ParticleDiffusion::PolynomialApproximation(_) => None,
        }
    }

    pub fn commit_step(&mut self) {
        match self {
            ParticleDiffusion::CrankNicolson(cn) => cn.commit_step(),
            ParticleDiffusion::PolynomialApproximation(pa) => pa.commit_step(),
        }
    }
}

/// Crank–Nicolson finite-difference particle
#[derive(Debug, Clone)]
pub struct CrankNicolson {
    radius: f64,
    cmax: f64,
    grid: Vec<f64>,
    /// Spherical Laplacian on the unit sphere (without D/Rp²)
    laplacian: CsMat<f64>,
    profile: StepHistory<Vec<f64>>,
    solver: FallbackSolver,
}

impl CrankNicolson {
    pub fn new(soc0: f64, radius: f64, cmax: f64, n: usize) -> Self {
        let n = n.max(3);
        let grid: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        let laplacian = spherical_laplacian(&grid);
        Self {
            radius,
            cmax,
            grid,
            laplacian,
            profile: StepHistory::new(vec![soc0; n]),
            solver: FallbackSolver::tridiagonal(),
        }
    }

    pub fn profile(&self) -> &[f64] {
        self.profile.present()
    }

    pub fn surface_soc(&self) -> f64 {
        self.profile.present()[self.grid.len() - 1]
    }

    /// Volume average ∫ 3r²·x dr (trapezoidal)
    pub fn average_soc(&self) -> f64 {
        let x = self.profile.present();
        let mut sum = 0.0;
        for i in 1..self.grid.len() {
            let (r0, r1) = (self.grid[i - 1], self.grid[i]);
            let f0 = 3.0 * r0 * r0 * x[i - 1];
            let f1 = 3.0 * r1 * r1 * x[i];
            sum += 0.5 * (f0 + f1) * (r1 - r0);
        }
        sum
    }

    pub fn commit_step(&mut self) {
        self.profile.commit_step();
    }

    /// Solve one Crank–Nicolson step from the last accepted profile
    ///
    /// Nothing moves before the clock has started (`total_time <= 0`).
    /// Negative concentrations produced by a large flux are clipped to zero.
    pub fn advance(&mut self, input: &DiffusionInput) -> SimResult<f64> {
        let old = self.profile.last_step().clone();
        if input.total_time <= 0.0 {
            self.profile.set(old);
            return Ok(self.surface_soc());
        }

        let n = self.grid.len();
        let dx = 1.0 / (n - 1) as f64;
        let d = input.diffusivity;
        let k = d / (self.radius * self.radius);
        let delta = -input.current_density * self.radius / (self.cmax * d * FARADAY);
        let surface_source = 2.0 * k * delta / dx + 2.0 * k * delta / self.grid[n - 1];

        let half = 0.5 * input.dt * k;
        let a = self.implicit_matrix(half);

        let mut b = old.clone();
        let lx = self.laplacian.apply(&old);
        for (bi, li) in b.iter_mut().zip(lx.iter()) {
            *bi += half * li;
        }
        b[n - 1] += input.dt * surface_source;

        let (mut x, _stats) = self.solver.solve(&a, &b)?;
        for v in x.iter_mut() {
            if *v < 0.0 {
                *v = 0.0;
            }
        }
        self.profile.set(x);
        Ok(self.surface_soc())
    }

    /// I − half·L
    fn implicit_matrix(&self, half: f64) -> CsMat<f64> {
        let n = self.grid.len();
        let mut tri = TriMat::with_capacity((n, n), 3 * n);
        for (row, vec) in self.laplacian.outer_iterator().enumerate() {
            for (col, &val) in vec.iter() {
                let identity = if row == col { 1.0 } else { 0.0 };
                tri.add_triplet(row, col, identity - half * val);
            }
        }
        tri.to_csr()
    }
}

/// Discrete `c'' + (2/r)·c'` on a uniform unit grid
///
/// Central differences; the centre row mirrors node 1 and the 1/r term
/// vanishes there. The surface row mirrors node n-2; the flux enters as a
/// source term.
fn spherical_laplacian(grid: &[f64]) -> CsMat<f64> {
    let n = grid.len();
    let dx = grid[1] - grid[0];
    let inv_dx2 = 1.0 / (dx * dx);
    let mut tri = TriMat::with_capacity((n, n), 3 * n);

    for i in 0..n {
        tri.add_triplet(i, i, -2.0 * inv_dx2);
        if i == 0 {
            tri.add_triplet(0, 1, 2.0 * inv_dx2);
        } else if i == n - 1 {
            tri.add_triplet(i, i - 1, 2.0 * inv_dx2);
        } else {
            let first = 1.0 / (grid[i] * dx);
            tri.add_triplet(i, i - 1, inv_dx2 - first);
            tri.add_triplet(i, i + 1, inv_dx2 + first);
        }
    }
    tri.to_csr()
}

/// Polynomial (parabolic profile) approximation of the particle
#[derive(Debug, Clone)]
pub struct PolynomialApproximation {
    radius: f64,
    cmax: f64,
    soc0: f64,
    /// Time integral of J/F (mol/m²)
    integrated_flux: StepHistory<f64>,
    surface: StepHistory<f64>,
}

impl PolynomialApproximation {
    pub fn new(soc0: f64, radius: f64, cmax: f64) -> Self {
        Self {
            radius,
            cmax,
            soc0,
            integrated_flux: StepHistory::new(0.0),
            surface: StepHistory::new(soc0),
        }
    }

    fn average_concentration(&self) -> f64 {
        -3.0 / self.radius * self.integrated_flux.present() + self.cmax * self.soc0
    }

    pub fn average_soc(&self) -> f64 {
        self.average_concentration() / self.cmax
    }

    pub fn advance(&mut self, input: &DiffusionInput) -> f64 {
        let j = input.current_density;
        let int_j = self.integrated_flux.last_step()
            + 0.5 * (j + input.last_current_density) / FARADAY * input.dt;
        self.integrated_flux.set(int_j);

        let c_avg = self.average_concentration();
        let c_surf = c_avg - j * self.radius / (5.0 * FARADAY * input.diffusivity);
        let soc = c_surf / self.cmax;
        self.surface.set(soc);
        soc
    }

    pub fn commit_step(&mut self) {
        self.integrated_flux.commit_step();
        self.surface.commit_step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RADIUS: f64 = 5e-6;
    const CMAX: f64 = 49188.0;
    const D: f64 = 1e-14;

    fn input(j: f64, dt: f64, t: f64) -> DiffusionInput {
        DiffusionInput {
            current_density: j,
            last_current_density: j,
            diffusivity: D,
            dt,
            total_time: t,
        }
    }

    #[test]
    fn test_solver_method_parsing() {
        assert_eq!("fd".parse::<SolverMethod>().unwrap(), SolverMethod::FiniteDifference);
        assert_eq!("Finite difference".parse::<SolverMethod>().unwrap(), SolverMethod::FiniteDifference);
        assert_eq!("PA".parse::<SolverMethod>().unwrap(), SolverMethod::PolynomialApproximation);
        assert!(matches!(
            "spectral".parse::<SolverMethod>(),
            Err(SimError::UnsupportedSolver(_))
        ));
    }

    #[test]
    fn test_laplacian_annihilates_constants() {
        let grid: Vec<f64> = (0..GRID_POINTS).map(|i| i as f64 / 24.0).collect();
        let l = spherical_laplacian(&grid);
        let y = l.apply(&vec![0.7; GRID_POINTS]);
        for v in y {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_flux_keeps_uniform_profile() {
        let mut cn = CrankNicolson::new(0.5, RADIUS, CMAX, GRID_POINTS);
        let soc = cn.advance(&input(0.0, 10.0, 10.0)).unwrap();
        assert_relative_eq!(soc, 0.5, epsilon = 1e-12);
        for v in cn.profile() {
            assert_relative_eq!(*v, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_no_update_before_clock_starts() {
        let mut cn = CrankNicolson::new(0.5, RADIUS, CMAX, GRID_POINTS);
        let soc = cn.advance(&input(5.0, 10.0, 0.0)).unwrap();
        assert_eq!(soc, 0.5);
    }

    #[test]
    fn test_delithiation_lowers_surface_first() {
        // Positive J removes lithium from the particle
        let mut cn = CrankNicolson::new(0.5, RADIUS, CMAX, GRID_POINTS);
        let mut t = 0.0;
        for _ in 0..20 {
            t += 5.0;
            cn.advance(&input(1.0, 5.0, t)).unwrap();
            cn.commit_step();
        }
        let p = cn.profile();
        assert!(p[GRID_POINTS - 1] < 0.5);
        assert!(p[GRID_POINTS - 1] < p[0]);
        assert!(cn.average_soc() < 0.5);
    }

    #[test]
    fn test_trial_advance_is_repeatable() {
        let mut cn = CrankNicolson::new(0.5, RADIUS, CMAX, GRID_POINTS);
        let a = cn.advance(&input(2.0, 1.0, 1.0)).unwrap();
        let b = cn.advance(&input(2.0, 1.0, 1.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_average_soc_tracks_charge_balance() {
        // d(soc_avg)/dt = -3 J / (Rp F cmax)
        let j = 1.0;
        let dt = 2.0;
        let steps = 500;
        let mut cn = CrankNicolson::new(0.6, RADIUS, CMAX, GRID_POINTS);
        for k in 1..=steps {
            cn.advance(&input(j, dt, k as f64 * dt)).unwrap();
            cn.commit_step();
        }
        let expected = 0.6 - 3.0 * j / (RADIUS * FARADAY * CMAX) * dt * steps as f64;
        assert_relative_eq!(cn.average_soc(), expected, max_relative = 0.02);
    }

    #[test]
    fn test_polynomial_matches_charge_balance() {
        let j = 1.0;
        let mut pa = PolynomialApproximation::new(0.6, RADIUS, CMAX);
        let dt = 2.0;
        for k in 1..=500 {
            pa.advance(&input(j, dt, k as f64 * dt));
            pa.commit_step();
        }
        let expected = 0.6 - 3.0 * j / (RADIUS * FARADAY * CMAX) * dt * 500.0;
        assert_relative_eq!(pa.average_soc(), expected, max_relative = 1e-9);
        // Surface sits below the average while delithiating
        assert!(*pa.surface.present() < pa.average_soc());
    }

    #[test]
    fn test_strategies_agree_at_quasi_steady_state() {
        let j = 0.5;
        let dt = 5.0;
        let mut fd = ParticleDiffusion::new(SolverMethod::FiniteDifference, 0.6, RADIUS, CMAX);
        let mut pa = ParticleDiffusion::new(SolverMethod::PolynomialApproximation, 0.6, RADIUS, CMAX);
        let mut fd_soc = 0.0;
        let mut pa_soc = 0.0;
        for k in 1..=400 {
            let i = input(j, dt, k as f64 * dt);
            fd_soc = fd.advance(&i).unwrap();
            pa_soc = pa.advance(&i).unwrap();
            fd.commit_step();
            pa.commit_step();
        }
        assert_relative_eq!(fd_soc, pa_soc, max_relative = 0.02);
    }
}
