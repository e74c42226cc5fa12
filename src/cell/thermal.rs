//! Lumped cell energy balance
//!
//! ```text
//! ρ·Cp·V·dT/dt = I·T·(dUp/dT − dUn/dT) + I·(ηp − ηn + I·R) − h·A·(T − T_amb)
//! ```
//!
//! Integrated with a backward-Euler step that treats the reversible term and
//! the convective loss implicitly, which gives a closed-form update for T.

use tracing::warn;

use crate::config::{CoolantParams, GlobalParams};
use crate::state::StepHistory;
use crate::utils::units::{kelvin_to_celsius, lpm_to_cubic_meters_per_second, KELVIN_OFFSET};

/// Temperature above which a warning is logged (K)
pub const HIGH_TEMPERATURE: f64 = KELVIN_OFFSET + 60.0;

/// Heat source terms of one time step
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatSources {
    /// Applied current (A)
    pub current: f64,
    /// Total electrolyte resistance (Ω)
    pub ohmic_resistance: f64,
    pub cathode_overpotential: f64,
    pub anode_overpotential: f64,
    /// dU/dT of the cathode (V/K)
    pub cathode_entropy: f64,
    /// dU/dT of the anode (V/K)
    pub anode_entropy: f64,
}

impl HeatSources {
    /// Volumetric heat generation (W/m³) at `temperature` in a cell of `volume`
    pub fn volumetric(&self, temperature: f64, volume: f64) -> f64 {
        let i = self.current;
        i * temperature / volume * (self.cathode_entropy - self.anode_entropy)
            + i / volume
                * (self.cathode_overpotential - self.anode_overpotential
                    + i * self.ohmic_resistance)
    }
}

/// Water-based coolant flowing past the cell
#[derive(Debug, Clone, Copy)]
pub struct CoolantLoop {
    pub inlet_temperature: f64,
    pub flow_rate_lpm: f64,
}

impl CoolantLoop {
    pub fn new(params: &CoolantParams) -> Self {
        Self {
            inlet_temperature: params.inlet_temperature,
            flow_rate_lpm: params.flow_rate_lpm,
        }
    }

    /// Coolant density (kg/m³)
    pub fn density(temperature: f64) -> f64 {
        -0.0035 * temperature * temperature + 1.7938 * temperature + 768.62
    }

    /// Coolant heat capacity (J/(kg·K))
    pub fn heat_capacity(temperature: f64) -> f64 {
        let t = temperature;
        3.7694718940962e04 - 3.9808781886345e02 * t + 1.7743407597823 * t * t
            - 3.5210730266402e-03 * t * t * t
            + 2.6283157323435e-06 * t * t * t * t
    }

    /// Coolant mass flow (kg/s)
    pub fn mass_flow(&self) -> f64 {
        lpm_to_cubic_meters_per_second(self.flow_rate_lpm) * Self::density(self.inlet_temperature)
    }

    /// Outlet temperature after absorbing `heat_generation` (W/m³) from `volume`
    pub fn outlet_temperature(&self, heat_generation: f64, volume: f64) -> f64 {
        let m_cp = self.mass_flow() * Self::heat_capacity(self.inlet_temperature);
        (heat_generation * volume + m_cp * self.inlet_temperature) / m_cp
    }

    /// Mean of inlet and outlet temperatures
    pub fn ambient_temperature(&self, heat_generation: f64, volume: f64) -> f64 {
        0.5 * (self.inlet_temperature + self.outlet_temperature(heat_generation, volume))
    }
}

/// Single-temperature cell
#[derive(Debug, Clone)]
pub struct ThermalModel {
    isothermal: bool,
    heat_capacity: f64,
    density: f64,
    volume: f64,
    h: f64,
    exposed_area: f64,
    temperature: StepHistory<f64>,
    ambient: f64,
    coolant: Option<CoolantLoop>,
    heat_generation: f64,
}

impl ThermalModel {
    /// # Arguments
    /// * `global` - Cell-level parameters (initial temperature, Cp, h, area)
    /// * `density` - Mean density of the electrochemically active stack (kg/m³)
    /// * `volume` - Total cell volume (m³)
    pub fn new(global: &GlobalParams, density: f64, volume: f64) -> Self {
        Self {
            isothermal: global.isothermal,
            heat_capacity: global.cp,
            density,
            volume,
            h: global.h,
            exposed_area: global.a_exposed,
            temperature: StepHistory::new(global.temperature),
            ambient: global.temperature,
            coolant: global.coolant.as_ref().map(CoolantLoop::new),
            heat_generation: 0.0,
        }
    }

    pub fn temperature(&self) -> f64 {
        *self.temperature.present()
    }

    pub fn last_temperature(&self) -> f64 {
        *self.temperature.last_step()
    }

    pub fn ambient_temperature(&self) -> f64 {
        self.ambient
    }

    pub fn set_ambient_temperature(&mut self, ambient: f64) {
        self.ambient = ambient;
    }

    pub fn heat_generation(&self) -> f64 {
        self.heat_generation
    }

    pub fn is_isothermal(&self) -> bool {
        self.isothermal
    }

    /// Advance the cell temperature over `dt` from the last accepted value
    pub fn update(&mut self, sources: &HeatSources, dt: f64) -> f64 {
        let t_old = self.last_temperature();
        if self.isothermal {
            self.temperature.set(t_old);
            return t_old;
        }

        let i = sources.current;
        let cap = self.heat_capacity * self.density * self.volume;
        let ha = self.h * self.exposed_area;
        let numerator = cap * t_old
            + dt * sources.ohmic_resistance * i * i
            + dt * (sources.cathode_overpotential - sources.anode_overpotential) * i
            + dt * ha * self.ambient;
        let denominator =
            cap + dt * (sources.anode_entropy - sources.cathode_entropy) * i + dt * ha;
        let t = numerator / denominator;

        if t > HIGH_TEMPERATURE {
            warn!(temperature_c = kelvin_to_celsius(t), "cell temperature above 60 °C");
        }
        self.temperature.set(t);
        t
    }

    /// Store the heat generation of the accepted step
    ///
    /// With a coolant loop configured the ambient temperature follows the
    /// mean coolant temperature.
    pub fn record_heat(&mut self, sources: &HeatSources) -> f64 {
        let q = sources.volumetric(self.temperature(), self.volume);
        self.heat_generation = q;
        if let Some(coolant) = &self.coolant {
            self.ambient = coolant.ambient_temperature(q, self.volume);
        }
        q
    }

    pub fn commit_step(&mut self) {
        self.temperature.commit_step();
    }
}
