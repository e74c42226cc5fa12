//! Configuration management for cell simulations
//!
//! Reads TOML parameter files and provides the structured record consumed by
//! [`CellModel`](crate::cell::CellModel) and
//! [`ScheduleStateMachine`](crate::schedule::ScheduleStateMachine).
//!
//! ```toml
//! [positive]
//! material = "NMC"
//! solver = "fd"
//! thickness = 70e-6
//! ...
//! [negative.sei]
//! i0s = 1.5e-6
//! ...
//! [[schedule]]
//! type = "cc"
//! condition = -1.0
//! stop = "voltage"
//! stop_condition = 3.0
//! max_dt = 2.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::electrode::SolverMethod;
use crate::error::{SimError, SimResult};
use crate::materials::{Arrhenius, Material};
use crate::schedule::{load_schedule, Step};
use crate::utils::units::kelvin_to_celsius;

/// Main cell configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CellConfig {
    /// Cathode
    pub positive: ElectrodeParams,
    /// Anode
    pub negative: ElectrodeParams,
    pub separator: LayerParams,
    pub al_foil: LayerParams,
    pub cu_foil: LayerParams,
    pub global: GlobalParams,
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub schedule: Vec<Step>,
}

/// Parameters of one porous electrode
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElectrodeParams {
    /// Active material tag
    pub material: Material,
    /// Particle diffusion strategy ("fd" or "pa")
    #[serde(default)]
    pub solver: SolverMethod,
    /// Electrode thickness (m)
    pub thickness: f64,
    /// Geometric (current collector) area (m²)
    pub area: f64,
    /// Apparent (coating) density (g/cm³)
    pub apparent_density: f64,
    /// Mass fraction of active material
    pub mass_frac_am: f64,
    /// Mass fraction of conductive carbon; the remainder is PVDF binder
    pub mass_frac_carbon: f64,
    /// Particle radius (m)
    pub particle_radius: f64,
    /// Specific capacity (mAh/g); defaults to the material's theoretical value
    #[serde(default)]
    pub capacity: Option<f64>,
    /// Solid diffusivity (m²/s) at 298 K
    pub ds: Arrhenius,
    /// Multiplier on the SOC-dependent diffusivity fit, where one exists
    #[serde(default = "default_one")]
    pub ds_factor: f64,
    /// Kinetic rate constant (m^2.5/(mol^0.5·s)) at 298 K
    pub kct: Arrhenius,
    /// Initial state of charge
    pub soc0: f64,
    /// Constant correction to the open-circuit potential (V)
    #[serde(default)]
    pub ocp_offset: f64,
    #[serde(default)]
    pub sei: SeiParams,
}

/// Solid electrolyte interphase film and side-reaction parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeiParams {
    /// Side-reaction exchange current density (A/m², surface basis) at 298 K
    #[serde(default = "default_zero_arrhenius")]
    pub i0s: Arrhenius,
    /// Side-reaction equilibrium potential (V)
    #[serde(default)]
    pub erefs: f64,
    /// Molar mass of the film (kg/mol)
    #[serde(default = "default_sei_molar_mass")]
    pub ms: f64,
    /// Film density (kg/m³)
    #[serde(default = "default_sei_density")]
    pub rhos: f64,
    /// Initial film thickness (m)
    #[serde(default)]
    pub lsei: f64,
    /// Film thickness at t = 0 of the cell's life (m); defaults to `lsei`
    #[serde(default)]
    pub lsei0: Option<f64>,
    /// Film ionic conductivity (S/m)
    #[serde(default = "default_one")]
    pub ks: f64,
    /// Initial film resistance (Ω·m², surface basis)
    #[serde(default)]
    pub rsei: f64,
}

impl Default for SeiParams {
    fn default() -> Self {
        Self {
            i0s: default_zero_arrhenius(),
            erefs: 0.0,
            ms: default_sei_molar_mass(),
            rhos: default_sei_density(),
            lsei: 0.0,
            lsei0: None,
            ks: default_one(),
            rsei: 0.0,
        }
    }
}

/// Separator or current-collector foil
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerParams {
    pub material: Material,
    /// Thickness (m)
    pub thickness: f64,
    /// Electrolyte-filled porosity (0 for foils)
    #[serde(default)]
    pub porosity: f64,
    /// Area (m²)
    pub area: f64,
}

/// Cell-level operating parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalParams {
    /// Initial and ambient temperature (K)
    pub temperature: f64,
    /// Hold temperature constant; accepts booleans or "yes"/"no"
    #[serde(deserialize_with = "yes_no_or_bool")]
    pub isothermal: bool,
    /// Electrolyte concentration (mol/m³)
    pub ce: f64,
    /// Cell heat capacity (J/(kg·K))
    pub cp: f64,
    /// Heat transfer coefficient (W/(m²·K))
    pub h: f64,
    /// Area exposed to the surroundings (m²)
    pub a_exposed: f64,
    /// Charge-transfer coefficient
    pub alpha: f64,
    pub max_v: f64,
    pub min_v: f64,
    /// Current below which a CV hold ends (A)
    pub i_cutoff: f64,
    /// Conductivity correction factor for the electrolyte
    #[serde(default = "default_unit_arrhenius")]
    pub electrolyte_factor: Arrhenius,
    #[serde(default = "default_bruggeman")]
    pub bruggeman: f64,
    /// Coolant loop setting the ambient temperature
    #[serde(default)]
    pub coolant: Option<CoolantParams>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoolantParams {
    /// Coolant inlet temperature (K)
    pub inlet_temperature: f64,
    /// Coolant flow rate (L/min)
    pub flow_rate_lpm: f64,
}

/// Run control and solver tolerances
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationParams {
    /// The run ends once the cycle counter exceeds this value
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,
    /// First time step (s)
    #[serde(default = "default_initial_dt")]
    pub initial_dt: f64,
    #[serde(default = "default_voltage_tolerance")]
    pub voltage_tolerance: f64,
    #[serde(default = "default_voltage_max_iterations")]
    pub voltage_max_iterations: usize,
    #[serde(default = "default_cv_tolerance")]
    pub cv_tolerance: f64,
    #[serde(default = "default_cv_max_iterations")]
    pub cv_max_iterations: usize,
    /// Hard cap on accepted time steps
    #[serde(default)]
    pub max_steps: Option<usize>,
    /// Plain-text schedule to use instead of `[[schedule]]`
    #[serde(default)]
    pub schedule_file: Option<String>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            max_cycles: default_max_cycles(),
            initial_dt: default_initial_dt(),
            voltage_tolerance: default_voltage_tolerance(),
            voltage_max_iterations: default_voltage_max_iterations(),
            cv_tolerance: default_cv_tolerance(),
            cv_max_iterations: default_cv_max_iterations(),
            max_steps: None,
            schedule_file: None,
        }
    }
}

fn default_one() -> f64 {
    1.0
}

fn default_bruggeman() -> f64 {
    1.5
}

fn default_sei_molar_mass() -> f64 {
    0.162
}

fn default_sei_density() -> f64 {
    1690.0
}

fn default_zero_arrhenius() -> Arrhenius {
    Arrhenius::constant(0.0)
}

fn default_unit_arrhenius() -> Arrhenius {
    Arrhenius::constant(1.0)
}

fn default_max_cycles() -> usize {
    4
}

fn default_initial_dt() -> f64 {
    0.1
}

fn default_voltage_tolerance() -> f64 {
    1e-4
}

fn default_voltage_max_iterations() -> usize {
    10
}

fn default_cv_tolerance() -> f64 {
    1e-3
}

fn default_cv_max_iterations() -> usize {
    50
}

fn yes_no_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(true),
            "no" | "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected yes/no, got '{}'",
                other
            ))),
        },
    }
}

impl ElectrodeParams {
    /// Mass fraction of PVDF binder
    pub fn mass_frac_binder(&self) -> f64 {
        1.0 - self.mass_frac_am - self.mass_frac_carbon
    }

    /// Specific capacity in mAh/g, falling back to the theoretical value
    pub fn specific_capacity(&self) -> SimResult<f64> {
        match self.capacity {
            Some(c) => Ok(c),
            None => self.material.thermodynamic_capacity(),
        }
    }

    fn validate(&self, name: &str) -> SimResult<()> {
        let fail = |msg: String| Err(SimError::Config(format!("{}: {}", name, msg)));
        if !self.material.is_active() {
            return fail(format!("{} is not an active material", self.material));
        }
        for (field, value) in [
            ("thickness", self.thickness),
            ("area", self.area),
            ("apparent_density", self.apparent_density),
            ("particle_radius", self.particle_radius),
            ("ds", self.ds.value),
            ("kct", self.kct.value),
            ("ds_factor", self.ds_factor),
        ] {
            if !(value > 0.0) {
                return fail(format!("{} must be positive, got {}", field, value));
            }
        }
        if !(self.mass_frac_am > 0.0)
            || self.mass_frac_carbon < 0.0
            || self.mass_frac_binder() < -1e-12
        {
            return fail(format!(
                "mass fractions must be non-negative and sum to at most 1 (AM {}, carbon {})",
                self.mass_frac_am, self.mass_frac_carbon
            ));
        }
        if !(0.0..=1.0).contains(&self.soc0) {
            return fail(format!("soc0 must lie in [0, 1], got {}", self.soc0));
        }
        if !(self.sei.ks > 0.0) || !(self.sei.rhos > 0.0) {
            return fail("SEI conductivity and density must be positive".to_string());
        }
        if let Some(c) = self.capacity {
            if !(c > 0.0) {
                return fail(format!("capacity must be positive, got {}", c));
            }
        }
        Ok(())
    }
}

impl LayerParams {
    fn validate(&self, name: &str) -> SimResult<()> {
        if !(self.thickness > 0.0) || !(self.area > 0.0) {
            return Err(SimError::Config(format!(
                "{}: thickness and area must be positive",
                name
            )));
        }
        if !(0.0..1.0).contains(&self.porosity) {
            return Err(SimError::Config(format!(
                "{}: porosity must lie in [0, 1), got {}",
                name, self.porosity
            )));
        }
        Ok(())
    }
}

impl CellConfig {
    /// Load configuration from TOML file
    ///
    /// A `simulation.schedule_file` is resolved relative to the config file
    /// and replaces any inline `[[schedule]]` steps.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;

        if let Some(file) = config.simulation.schedule_file.clone() {
            let schedule_path = match path.parent() {
                Some(dir) => dir.join(&file),
                None => file.into(),
            };
            config.schedule = load_schedule(schedule_path)?;
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> SimResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Check physical ranges; fail fast on the first violation
    pub fn validate(&self) -> SimResult<()> {
        self.positive.validate("positive")?;
        self.negative.validate("negative")?;
        self.separator.validate("separator")?;
        self.al_foil.validate("al_foil")?;
        self.cu_foil.validate("cu_foil")?;

        if !(self.separator.porosity > 0.0) {
            return Err(SimError::Config("separator porosity must be positive".into()));
        }

        let g = &self.global;
        if !(g.temperature > 0.0) || !(g.ce > 0.0) || !(g.cp > 0.0) {
            return Err(SimError::Config(
                "temperature, ce and cp must be positive".into(),
            ));
        }
        if !(g.alpha > 0.0 && g.alpha < 1.0) {
            return Err(SimError::Config(format!(
                "alpha must lie in (0, 1), got {}",
                g.alpha
            )));
        }
        if g.h < 0.0 || g.a_exposed < 0.0 {
            return Err(SimError::Config("h and a_exposed must be non-negative".into()));
        }
        if g.min_v >= g.max_v {
            return Err(SimError::Config(format!(
                "min_v ({}) must be below max_v ({})",
                g.min_v, g.max_v
            )));
        }
        if let Some(c) = &g.coolant {
            if !(c.flow_rate_lpm > 0.0) || !(c.inlet_temperature > 0.0) {
                return Err(SimError::Config(
                    "coolant flow rate and inlet temperature must be positive".into(),
                ));
            }
        }

        let s = &self.simulation;
        if !(s.initial_dt > 0.0) || s.voltage_max_iterations == 0 || s.cv_max_iterations == 0 {
            return Err(SimError::Config(
                "initial_dt and iteration limits must be positive".into(),
            ));
        }

        if self.schedule.is_empty() {
            return Err(SimError::Config("schedule has no steps".into()));
        }
        for (i, step) in self.schedule.iter().enumerate() {
            step.validate()
                .map_err(|msg| SimError::Config(format!("schedule step {}: {}", i, msg)))?;
        }
        Ok(())
    }

    /// Log a configuration summary
    pub fn log_summary(&self) {
        info!(
            cathode = %self.positive.material,
            anode = %self.negative.material,
            cathode_solver = %self.positive.solver,
            anode_solver = %self.negative.solver,
            "cell configuration"
        );
        info!(
            temperature_c = kelvin_to_celsius(self.global.temperature),
            isothermal = self.global.isothermal,
            min_v = self.global.min_v,
            max_v = self.global.max_v,
            i_cutoff = self.global.i_cutoff,
            "operating window"
        );
        info!(
            steps = self.schedule.len(),
            max_cycles = self.simulation.max_cycles,
            "cycling schedule"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[positive]
material = "NMC"
thickness = 70e-6
area = 0.05
apparent_density = 3.0
mass_frac_am = 0.9
mass_frac_carbon = 0.05
particle_radius = 5e-6
ds = 1e-14
kct = { value = 5e-11, activation_energy = 30000.0 }
soc0 = 0.42

[negative]
material = "MCMB2"
solver = "pa"
thickness = 80e-6
area = 0.05
apparent_density = 1.5
mass_frac_am = 0.92
mass_frac_carbon = 0.02
particle_radius = 8e-6
ds = 3.9e-14
kct = 5e-11
soc0 = 0.85

[negative.sei]
i0s = 1.5e-6
erefs = 0.4
lsei = 5e-9
ks = 5e-6

[separator]
material = "separator"
thickness = 25e-6
porosity = 0.4
area = 0.05

[al_foil]
material = "Alfoil"
thickness = 15e-6
area = 0.05

[cu_foil]
material = "Cufoil"
thickness = 10e-6
area = 0.05

[global]
temperature = 298.15
isothermal = "yes"
ce = 1000.0
cp = 1000.0
h = 10.0
a_exposed = 0.01
alpha = 0.5
max_v = 4.2
min_v = 3.0
i_cutoff = 0.1

[[schedule]]
type = "cc"
condition = -1.0
stop = "voltage"
stop_condition = 3.0
max_dt = 2.0
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = CellConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.positive.material, Material::Nmc);
        assert_eq!(config.positive.solver, SolverMethod::FiniteDifference);
        assert_eq!(config.negative.solver, SolverMethod::PolynomialApproximation);
        assert!(config.global.isothermal);
        assert_eq!(config.global.bruggeman, 1.5);
        assert_eq!(config.global.electrolyte_factor, Arrhenius::constant(1.0));
        assert_eq!(config.simulation.max_cycles, 4);
        assert_eq!(config.positive.sei.i0s.value, 0.0);
        assert_eq!(config.negative.sei.ks, 5e-6);
        assert_eq!(config.schedule.len(), 1);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_material_rejected() {
        let bad = MINIMAL.replace("material = \"MCMB2\"", "material = \"unobtainium\"");
        assert!(CellConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_unknown_solver_rejected() {
        let bad = MINIMAL.replace("solver = \"pa\"", "solver = \"spectral\"");
        assert!(CellConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_bad_isothermal_flag_rejected() {
        let bad = MINIMAL.replace("isothermal = \"yes\"", "isothermal = \"maybe\"");
        assert!(CellConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_validate_catches_empty_schedule() {
        let mut config = CellConfig::from_toml_str(MINIMAL).unwrap();
        config.schedule.clear();
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_validate_catches_inactive_electrode() {
        let mut config = CellConfig::from_toml_str(MINIMAL).unwrap();
        config.positive.material = Material::Carbon;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capacity_defaults_to_theoretical() {
        let config = CellConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.positive.specific_capacity().unwrap(), 277.54);
    }
}
