//! Electrode composition derived from the coating recipe
//!
//! Mass fractions and the apparent coating density fix the solid volume
//! fractions, the porosity, the electrochemically active surface area, the
//! electrode mass and the maximum lithium concentration of the active phase.

use crate::config::ElectrodeParams;
use crate::error::{SimError, SimResult};
use crate::materials::Material;
use crate::utils::units::{mah_per_gram_to_coulombs_per_gram, FARADAY};

/// Derived geometric and compositional quantities of one electrode
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Volume fraction of active material within the solids
    pub vol_frac_am: f64,
    /// Volume fraction of conductive carbon within the solids
    pub vol_frac_carbon: f64,
    /// Volume fraction of PVDF binder within the solids
    pub vol_frac_binder: f64,
    /// Electrolyte-filled porosity
    pub porosity: f64,
    /// Electrode volume (m³)
    pub volume: f64,
    /// Electrode mass including electrolyte (kg)
    pub mass: f64,
    /// Active surface area (m²)
    pub surface_area: f64,
    /// Maximum lithium concentration of the active phase (mol/m³)
    pub cmax: f64,
}

impl Composition {
    /// Derive the composition from the electrode parameters
    ///
    /// Fails if the recipe yields a porosity outside (0, 1), which means the
    /// apparent density is inconsistent with the mass fractions.
    pub fn from_params(params: &ElectrodeParams) -> SimResult<Self> {
        let am = params.material;
        let rho_am = am.density();
        let rho_c = Material::Carbon.density();
        let rho_b = Material::Pvdf.density();

        let v_am = params.mass_frac_am / rho_am;
        let v_c = params.mass_frac_carbon / rho_c;
        let v_b = params.mass_frac_binder().max(0.0) / rho_b;
        let v_total = v_am + v_c + v_b;

        let vol_frac_am = v_am / v_total;
        let vol_frac_carbon = v_c / v_total;
        let vol_frac_binder = v_b / v_total;

        // Apparent density is given in g/cm³
        let solid_density =
            vol_frac_am * rho_am + vol_frac_carbon * rho_c + vol_frac_binder * rho_b;
        let porosity = 1.0 - params.apparent_density * 1000.0 / solid_density;
        if !(porosity > 0.0 && porosity < 1.0) {
            return Err(SimError::Config(format!(
                "{} electrode: apparent density {} g/cm³ gives porosity {:.4}",
                am, params.apparent_density, porosity
            )));
        }

        let volume = params.area * params.thickness;
        let solid = 1.0 - porosity;
        let mass = volume
            * (solid_density * solid + Material::Electrolyte.density() * porosity);
        let surface_area =
            3.0 * vol_frac_am * solid / params.particle_radius * params.thickness * params.area;

        let capacity = params.specific_capacity()?;
        // C/g · kg/m³ · 1000 g/kg / F
        let cmax = mah_per_gram_to_coulombs_per_gram(capacity) * rho_am * 1000.0 / FARADAY;

        Ok(Self {
            vol_frac_am,
            vol_frac_carbon,
            vol_frac_binder,
            porosity,
            volume,
            mass,
            surface_area,
            cmax,
        })
    }

    /// Charge the active material holds between SOC 0 and 1 (A·s)
    pub fn theoretical_charge(&self) -> f64 {
        self.cmax * FARADAY * self.volume * self.vol_frac_am * (1.0 - self.porosity)
    }
}
