//! Transport and rate properties: Arrhenius scaling, SOC-dependent solid
//! diffusivity and electrolyte ionic conductivity.

use serde::{Deserialize, Serialize};

use crate::materials::Material;
use crate::utils::units::{GAS_CONSTANT, REFERENCE_TEMPERATURE};

/// Scale a reference value from 298 K to `temperature`
///
/// `value · exp(-Ea/R · (1/T - 1/298))`
#[inline]
pub fn arrhenius(reference: f64, activation_energy: f64, temperature: f64) -> f64 {
    reference
        * (-activation_energy / GAS_CONSTANT * (1.0 / temperature - 1.0 / REFERENCE_TEMPERATURE))
            .exp()
}

/// A temperature-dependent parameter given at the reference temperature
///
/// In TOML either a bare number (no temperature dependence) or a table
/// `{ value = .., activation_energy = .. }` with the activation energy in J/mol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ArrheniusRepr")]
pub struct Arrhenius {
    /// Value at 298 K
    pub value: f64,
    /// Activation energy (J/mol), zero for a temperature-independent value
    pub activation_energy: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArrheniusRepr {
    Constant(f64),
    Scaled {
        value: f64,
        #[serde(default)]
        activation_energy: f64,
    },
}

impl From<ArrheniusRepr> for Arrhenius {
    fn from(repr: ArrheniusRepr) -> Self {
        match repr {
            ArrheniusRepr::Constant(value) => Arrhenius::constant(value),
            ArrheniusRepr::Scaled {
                value,
                activation_energy,
            } => Arrhenius {
                value,
                activation_energy,
            },
        }
    }
}

impl Arrhenius {
    pub fn new(value: f64, activation_energy: f64) -> Self {
        Self {
            value,
            activation_energy,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    /// Evaluate at `temperature` (K)
    #[inline]
    pub fn at(&self, temperature: f64) -> f64 {
        arrhenius(self.value, self.activation_energy, temperature)
    }

    /// Same activation energy, different reference value
    pub fn with_value(&self, value: f64) -> Self {
        Self::new(value, self.activation_energy)
    }
}

/// SOC-dependent solid-phase diffusivity (m²/s) where one is known
///
/// NMC follows a log-polynomial fit in y of Li_y[M]O2 (Shaju 2004). Other
/// materials return `None` and keep their configured constant.
pub fn solid_diffusivity(material: Material, soc: f64) -> Option<f64> {
    match material {
        Material::Nmc => {
            let y = soc;
            let log_ds = -63.061 * y.powi(5) + 239.8 * y.powi(4) - 343.74 * y.powi(3)
                + 232.45 * y.powi(2)
                - 74.337 * y
                - 0.2517;
            // cm²/s to m²/s
            Some(10f64.powf(log_ds) / 1e4)
        }
        _ => None,
    }
}

/// Effective ionic conductivity (S/m) of a PC:EC:DEC electrolyte in a
/// porous layer, with a Bruggeman porosity correction
///
/// # Arguments
/// * `ce` - Electrolyte concentration (mol/m³)
/// * `temperature` - Temperature (K)
/// * `bruggeman` - Bruggeman exponent (1.5 for packed spheres)
/// * `porosity` - Layer porosity
pub fn ionic_conductivity(ce: f64, temperature: f64, bruggeman: f64, porosity: f64) -> f64 {
    let t = temperature;
    let poly = -10.5 + 0.000668 * ce + 0.000000494 * ce * ce + 0.074 * t
        - 0.0000178 * t * ce
        - 0.000000000886 * ce * ce * t
        - 0.0000696 * t * t
        + 0.000000028 * t * t * ce;
    0.0001 * ce * poly * poly * porosity.powf(bruggeman)
}
