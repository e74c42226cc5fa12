use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Material tags known to the property tables
///
/// Tags are parsed case-insensitively from their conventional spelling
/// (`"NMC"`, `"LMnO"`, `"MCMB2"`, `"Alfoil"`, ...). Anything else is a
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Material {
    Nmc,
    Lco,
    Nca,
    Lmno,
    Mcmb1,
    Mcmb2,
    Pvdf,
    Carbon,
    Separator,
    Electrolyte,
    AlFoil,
    CuFoil,
}

impl Material {
    pub const ALL: [Material; 12] = [
        Material::Nmc,
        Material::Lco,
        Material::Nca,
        Material::Lmno,
        Material::Mcmb1,
        Material::Mcmb2,
        Material::Pvdf,
        Material::Carbon,
        Material::Separator,
        Material::Electrolyte,
        Material::AlFoil,
        Material::CuFoil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Nmc => "NMC",
            Material::Lco => "LCO",
            Material::Nca => "NCA",
            Material::Lmno => "LMnO",
            Material::Mcmb1 => "MCMB1",
            Material::Mcmb2 => "MCMB2",
            Material::Pvdf => "PVDF",
            Material::Carbon => "carbon",
            Material::Separator => "separator",
            Material::Electrolyte => "electrolyte",
            Material::AlFoil => "Alfoil",
            Material::CuFoil => "Cufoil",
        }
    }

    /// True for intercalation materials that can host lithium
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Material::Nmc
                | Material::Lco
                | Material::Nca
                | Material::Lmno
                | Material::Mcmb1
                | Material::Mcmb2
        )
    }

    /// Density of the pure phase (kg/m³)
    pub fn density(&self) -> f64 {
        match self {
            Material::Nmc => 4750.0,
            Material::Lco => 5031.0,
            Material::Nca => 4450.0,
            Material::Lmno => 4290.0,
            Material::Mcmb1 | Material::Mcmb2 => 2260.0,
            Material::Pvdf => 1760.0,
            Material::Carbon => 2000.0,
            Material::Separator => 1324.0,
            Material::Electrolyte => 1204.0,
            Material::AlFoil => 2700.0,
            Material::CuFoil => 8930.0,
        }
    }

    /// Theoretical specific capacity of an active material (mAh/g)
    pub fn thermodynamic_capacity(&self) -> SimResult<f64> {
        match self {
            Material::Nmc => Ok(277.54),
            Material::Lco => Ok(273.8),
            Material::Nca => Ok(278.01),
            Material::Lmno => Ok(148.22),
            Material::Mcmb1 | Material::Mcmb2 => Ok(363.0),
            other => Err(SimError::MissingProperty {
                material: other.as_str(),
                property: "thermodynamic capacity",
            }),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Material::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| SimError::UnknownMaterial(tag.to_string()))
    }
}

impl TryFrom<String> for Material {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Material> for String {
    fn from(material: Material) -> Self {
        material.as_str().to_string()
    }
}
