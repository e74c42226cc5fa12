//! Solid electrolyte interphase film
//!
//! The film thickens through a side reaction that consumes lithium during
//! charge. Thickness is integrated explicitly from the side-reaction current
//! of the last accepted step:
//!
//! ```text
//! L_new = L_old − Js·M/(ρ·F)·dt
//! R     = L_new / κ
//! ```

use crate::config::SeiParams;
use crate::materials::Arrhenius;
use crate::state::StepHistory;
use crate::utils::units::{FARADAY, GAS_CONSTANT};

/// Transfer coefficient of the side reaction
pub const SIDE_REACTION_ALPHA: f64 = 0.5;

/// Film state and side-reaction parameters of one electrode
#[derive(Debug, Clone)]
pub struct SeiFilm {
    exchange_current: Arrhenius,
    equilibrium_potential: f64,
    molar_mass: f64,
    density: f64,
    conductivity: f64,
    initial_thickness: f64,
    thickness: StepHistory<f64>,
    /// Film resistance (Ω·m², surface basis)
    resistance: StepHistory<f64>,
}

impl SeiFilm {
    pub fn new(params: &SeiParams) -> Self {
        Self {
            exchange_current: params.i0s,
            equilibrium_potential: params.erefs,
            molar_mass: params.ms,
            density: params.rhos,
            conductivity: params.ks,
            initial_thickness: params.lsei0.unwrap_or(params.lsei),
            thickness: StepHistory::new(params.lsei),
            resistance: StepHistory::new(params.rsei),
        }
    }

    pub fn thickness(&self) -> f64 {
        *self.thickness.present()
    }

    /// Growth since the start of the cell's life (m)
    pub fn growth(&self) -> f64 {
        self.thickness() - self.initial_thickness
    }

    pub fn resistance(&self) -> f64 {
        *self.resistance.present()
    }

    /// Grow the film over `dt` with the last accepted side current
    pub fn grow(&mut self, side_current_density: f64, dt: f64) {
        let l = self.thickness.last_step()
            - side_current_density * self.molar_mass / (self.density * FARADAY) * dt;
        self.thickness.set(l);
        self.resistance.set(l / self.conductivity);
    }

    /// Side-reaction current density (A/m², surface basis)
    ///
    /// Active only while charging after the first cycle. The driving force is
    /// the electrode potential less the side-reaction equilibrium potential
    /// and the ohmic drop of `current_density` across the film.
    pub fn side_current_density(
        &self,
        applied_current: f64,
        cycle: usize,
        potential: f64,
        current_density: f64,
        temperature: f64,
    ) -> f64 {
        if applied_current <= 0.0 || cycle <= 1 {
            return 0.0;
        }
        let i0 = self.exchange_current.at(temperature);
        let drop = current_density * self.resistance();
        let f = SIDE_REACTION_ALPHA * FARADAY / (GAS_CONSTANT * temperature);
        -i0 * (-f * (potential - self.equilibrium_potential - drop)).exp()
    }

    pub fn commit_step(&mut self) {
        self.thickness.commit_step();
        self.resistance.commit_step();
    }
}
