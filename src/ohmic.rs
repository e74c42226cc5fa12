//! Separator and current-collector layers
//!
//! These layers store no lithium. The separator adds electrolyte resistance
//! to the cell; the foils only contribute mass and volume to the thermal
//! balance.

use crate::config::LayerParams;
use crate::materials::{ionic_conductivity, Material};

/// Passive layer with electrolyte-filled porosity
#[derive(Debug, Clone)]
pub struct OhmicElement {
    material: Material,
    thickness: f64,
    porosity: f64,
    area: f64,
}

impl OhmicElement {
    pub fn new(params: &LayerParams) -> Self {
        Self {
            material: params.material,
            thickness: params.thickness,
            porosity: params.porosity,
            area: params.area,
        }
    }

    pub fn material(&self) -> Material {
        self.material
    }

    /// Electrolyte resistance across the layer (Ω)
    ///
    /// Infinite for a layer without porosity.
    pub fn resistance(&self, ce: f64, temperature: f64, bruggeman: f64) -> f64 {
        let sigma = ionic_conductivity(ce, temperature, bruggeman, self.porosity);
        self.thickness / (self.area * sigma)
    }

    /// Layer volume (m³)
    pub fn volume(&self) -> f64 {
        self.thickness * self.area
    }

    /// Layer mass including the electrolyte in its pores (kg)
    pub fn mass(&self) -> f64 {
        self.volume() * (self.material.density() + Material::Electrolyte.density() * self.porosity)
    }
}
