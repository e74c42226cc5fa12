//! Two-electrode cell with separator and current collectors
//!
//! For a trial applied current the cell advances both particles, evaluates
//! both electrode potentials and closes the terminal voltage
//!
//! ```text
//! V = φ_cathode − φ_anode + I·R_ohm
//! ```
//!
//! with a fixed-point iteration. Constant-voltage steps wrap this in a
//! secant search for the current. All trial evaluations start from the last
//! accepted state; [`CellModel::solve_step`] commits exactly one of them.

use tracing::debug;

use crate::cell::capacity::{Throughput, ThroughputCounter};
use crate::cell::cv::CvSearch;
use crate::cell::thermal::{HeatSources, ThermalModel};
use crate::config::CellConfig;
use crate::electrode::{Conditions, Electrode, ElectrodeKind};
use crate::error::{SimError, SimResult};
use crate::linalg::{fixed_point_solve, FixedPointConfig};
use crate::materials::Arrhenius;
use crate::ohmic::OhmicElement;
use crate::state::StepHistory;

/// How the applied current of a step is determined
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepControl {
    /// Fixed applied current (A), positive on charge
    ConstantCurrent(f64),
    /// Hold the terminal voltage; the current is searched from `initial_current`
    ConstantVoltage { target: f64, initial_current: f64 },
}

/// Everything the cell needs to know about one time step
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    pub control: StepControl,
    /// Time step (s)
    pub dt: f64,
    /// Simulated time at the end of the step (s)
    pub total_time: f64,
    pub cycle: usize,
    /// First time step of a new cycle: archive and reset throughput
    pub new_cycle: bool,
}

/// Accepted state after one time step
#[derive(Debug, Clone, Copy)]
pub struct StepSolution {
    pub current: f64,
    pub voltage: f64,
    pub temperature: f64,
    /// Volumetric heat generation (W/m³)
    pub heat_generation: f64,
    /// Polarization, film and electrolyte resistance (Ω)
    pub internal_resistance: f64,
    pub cathode_soc: f64,
    pub anode_soc: f64,
    /// Voltage evaluations spent in the CV search, 0 for CC
    pub cv_iterations: usize,
}

/// Single-particle lithium-ion cell
#[derive(Debug, Clone)]
pub struct CellModel {
    cathode: Electrode,
    anode: Electrode,
    separator: OhmicElement,
    al_foil: OhmicElement,
    cu_foil: OhmicElement,
    thermal: ThermalModel,
    throughput: ThroughputCounter,
    ce: f64,
    alpha: f64,
    bruggeman: f64,
    electrolyte_factor: Arrhenius,
    voltage_loop: FixedPointConfig,
    cv_tolerance: f64,
    cv_max_iterations: usize,
    voltage: StepHistory<f64>,
    current: StepHistory<f64>,
    internal_resistance: f64,
}

impl CellModel {
    /// Assemble the cell at rest
    ///
    /// The initial terminal voltage is the open-circuit voltage at the
    /// initial electrode SOCs.
    pub fn new(config: &CellConfig) -> SimResult<Self> {
        let g = &config.global;
        let cathode = Electrode::new(ElectrodeKind::Cathode, &config.positive, g.temperature)?;
        let anode = Electrode::new(ElectrodeKind::Anode, &config.negative, g.temperature)?;
        let separator = OhmicElement::new(&config.separator);
        let al_foil = OhmicElement::new(&config.al_foil);
        let cu_foil = OhmicElement::new(&config.cu_foil);

        // The thermal mass density covers the electrochemical stack only
        let stack_mass = cathode.mass() + separator.mass() + anode.mass();
        let stack_volume = cathode.volume() + separator.volume() + anode.volume();
        let total_volume = stack_volume + al_foil.volume() + cu_foil.volume();
        let thermal = ThermalModel::new(g, stack_mass / stack_volume, total_volume);

        let ocv = cathode.potential() - anode.potential();
        let sim = &config.simulation;

        Ok(Self {
            cathode,
            anode,
            separator,
            al_foil,
            cu_foil,
            thermal,
            throughput: ThroughputCounter::new(),
            ce: g.ce,
            alpha: g.alpha,
            bruggeman: g.bruggeman,
            electrolyte_factor: g.electrolyte_factor,
            voltage_loop: FixedPointConfig::new(sim.voltage_max_iterations, sim.voltage_tolerance),
            cv_tolerance: sim.cv_tolerance,
            cv_max_iterations: sim.cv_max_iterations,
            voltage: StepHistory::new(ocv),
            current: StepHistory::new(0.0),
            internal_resistance: 0.0,
        })
    }

    /// Electrolyte resistance of cathode, anode and separator (Ω)
    pub fn ohmic_resistance(&self, temperature: f64) -> f64 {
        let factor = self.electrolyte_factor.at(temperature);
        (self.cathode.ohmic_resistance(self.ce, temperature, self.bruggeman)
            + self.anode.ohmic_resistance(self.ce, temperature, self.bruggeman)
            + self.separator.resistance(self.ce, temperature, self.bruggeman))
            / factor
    }

    fn conditions(&self, applied_current: f64, temperature: f64) -> Conditions {
        Conditions {
            applied_current,
            temperature,
            ce: self.ce,
            alpha: self.alpha,
        }
    }

    /// Heat sources at the last accepted operating point, driven by `current`
    fn committed_heat_sources(&self, current: f64) -> SimResult<HeatSources> {
        Ok(HeatSources {
            current,
            ohmic_resistance: self.ohmic_resistance(self.thermal.last_temperature()),
            cathode_overpotential: self.cathode.last_overpotential(),
            anode_overpotential: self.anode.last_overpotential(),
            cathode_entropy: self.cathode.last_entropic_coefficient()?,
            anode_entropy: self.anode.last_entropic_coefficient()?,
        })
    }

    fn present_heat_sources(&self, current: f64) -> SimResult<HeatSources> {
        Ok(HeatSources {
            current,
            ohmic_resistance: self.ohmic_resistance(self.thermal.temperature()),
            cathode_overpotential: self.cathode.overpotential(),
            anode_overpotential: self.anode.overpotential(),
            cathode_entropy: self.cathode.entropic_coefficient()?,
            anode_entropy: self.anode.entropic_coefficient()?,
        })
    }

    /// Terminal voltage for a trial applied current
    ///
    /// Repeatable: every call restarts from the last accepted state.
    pub fn evaluate(&mut self, current: f64, input: &StepInput) -> SimResult<f64> {
        let dt = input.dt;
        let sources = if self.thermal.is_isothermal() {
            HeatSources::default()
        } else {
            self.committed_heat_sources(current)?
        };
        let temperature = self.thermal.update(&sources, dt);

        for electrode in [&mut self.cathode, &mut self.anode] {
            electrode.update_film(dt);
        }
        for electrode in [&mut self.cathode, &mut self.anode] {
            electrode.update_side_reaction(current, input.cycle, temperature);
        }
        for electrode in [&mut self.cathode, &mut self.anode] {
            electrode.advance_soc(current, dt, input.total_time, temperature)?;
        }

        let conditions = self.conditions(current, temperature);
        let ohmic_drop = current * self.ohmic_resistance(temperature);
        let cathode = &mut self.cathode;
        let anode = &mut self.anode;
        let (voltage, stats) = fixed_point_solve(&self.voltage_loop, f64::INFINITY, |_| {
            let phi_c = cathode.update_potential(&conditions)?;
            let phi_a = anode.update_potential(&conditions)?;
            Ok(phi_c - phi_a + ohmic_drop)
        })?;

        if !voltage.is_finite() {
            return Err(SimError::Diverged {
                time: input.total_time,
                message: format!(
                    "terminal voltage {} at I = {} A after {} iterations",
                    voltage, current, stats.iterations
                ),
            });
        }

        self.internal_resistance =
            self.electrode_resistance(&conditions) + self.ohmic_resistance(temperature);
        self.voltage.set(voltage);
        self.current.set(current);
        Ok(voltage)
    }

    /// Polarization and film resistance of both electrodes (Ω)
    fn electrode_resistance(&self, conditions: &Conditions) -> f64 {
        self.cathode.polarization_resistance(conditions) / self.cathode.area()
            + self.anode.polarization_resistance(conditions) / self.anode.area()
    }

    /// Solve and accept one time step
    pub fn solve_step(&mut self, input: &StepInput) -> SimResult<StepSolution> {
        if input.new_cycle {
            let finished = self.throughput.begin_cycle(input.cycle);
            debug!(cycle = input.cycle, discharge_ah = finished.discharge_ah(), "throughput reset");
        }

        let (current, voltage, cv_iterations) = match input.control {
            StepControl::ConstantCurrent(current) => {
                let v = self.evaluate(current, input)?;
                (current, v, 0)
            }
            StepControl::ConstantVoltage {
                target,
                initial_current,
            } => {
                let mut search = CvSearch::new(target, self.cv_tolerance, self.cv_max_iterations);
                let seed_voltage = *self.voltage.last_step();
                let outcome =
                    search.solve(initial_current, seed_voltage, |i| self.evaluate(i, input))?;
                (outcome.current, outcome.voltage, outcome.iterations)
            }
        };

        let sources = self.present_heat_sources(current)?;
        let heat_generation = self.thermal.record_heat(&sources);

        self.cathode.commit_step();
        self.anode.commit_step();
        self.thermal.commit_step();
        self.throughput.accumulate(
            current,
            *self.current.last_step(),
            voltage,
            *self.voltage.last_step(),
            input.dt,
        );
        self.voltage.commit_step();
        self.current.commit_step();

        Ok(StepSolution {
            current,
            voltage,
            temperature: self.thermal.temperature(),
            heat_generation,
            internal_resistance: self.internal_resistance,
            cathode_soc: self.cathode.soc(),
            anode_soc: self.anode.soc(),
            cv_iterations,
        })
    }

    /// Open-circuit voltage at the last accepted surface SOCs
    pub fn open_circuit_voltage(&self) -> SimResult<f64> {
        let t = self.thermal.last_temperature();
        Ok(self.cathode.open_circuit_potential_at(t)? - self.anode.open_circuit_potential_at(t)?)
    }

    pub fn cathode(&self) -> &Electrode {
        &self.cathode
    }

    pub fn anode(&self) -> &Electrode {
        &self.anode
    }

    pub fn voltage(&self) -> f64 {
        *self.voltage.present()
    }

    pub fn current(&self) -> f64 {
        *self.current.present()
    }

    pub fn temperature(&self) -> f64 {
        self.thermal.temperature()
    }

    pub fn thermal(&self) -> &ThermalModel {
        &self.thermal
    }

    /// Override the ambient temperature, e.g. from a pack-level coolant model
    pub fn set_ambient_temperature(&mut self, ambient: f64) {
        self.thermal.set_ambient_temperature(ambient);
    }

    pub fn internal_resistance(&self) -> f64 {
        self.internal_resistance
    }

    pub fn throughput(&self) -> &Throughput {
        self.throughput.cumulative()
    }

    pub fn counters(&self) -> &ThroughputCounter {
        &self.throughput
    }

    /// Mass of all five layers (kg)
    pub fn mass(&self) -> f64 {
        self.cathode.mass()
            + self.anode.mass()
            + self.separator.mass()
            + self.al_foil.mass()
            + self.cu_foil.mass()
    }

    /// Volume of all five layers (m³)
    pub fn volume(&self) -> f64 {
        self.cathode.volume()
            + self.anode.volume()
            + self.separator.volume()
            + self.al_foil.volume()
            + self.cu_foil.volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> CellConfig {
        CellConfig::from_toml_str(include_str!("../../fixtures/nmc_graphite.toml")).unwrap()
    }

    fn cc(current: f64, dt: f64, total_time: f64) -> StepInput {
        StepInput {
            control: StepControl::ConstantCurrent(current),
            dt,
            total_time,
            cycle: 0,
            new_cycle: false,
        }
    }

    #[test]
    fn test_initial_voltage_is_open_circuit() {
        let cell = CellModel::new(&config()).unwrap();
        assert_relative_eq!(cell.voltage(), cell.open_circuit_voltage().unwrap(), epsilon = 1e-12);
        assert!(cell.voltage() > 4.0 && cell.voltage() < 4.3);
    }

    #[test]
    fn test_zero_current_keeps_open_circuit_voltage() {
        let mut cell = CellModel::new(&config()).unwrap();
        let v0 = cell.voltage();
        let s = cell.solve_step(&cc(0.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(s.voltage, v0, epsilon = 1e-9);
    }

    #[test]
    fn test_discharge_drops_voltage_below_ocv() {
        let mut cell = CellModel::new(&config()).unwrap();
        let v0 = cell.voltage();
        let s = cell.solve_step(&cc(-1.0, 1.0, 1.0)).unwrap();
        assert!(s.voltage < v0);
        assert!(s.cathode_soc > 0.42);
        assert!(s.anode_soc < 0.85);
        assert!(s.internal_resistance > cell.ohmic_resistance(298.15));
    }

    #[test]
    fn test_evaluate_is_repeatable_within_a_step() {
        let mut cell = CellModel::new(&config()).unwrap();
        let input = cc(-2.0, 5.0, 5.0);
        let a = cell.evaluate(-2.0, &input).unwrap();
        let _ = cell.evaluate(1.0, &input).unwrap();
        let b = cell.evaluate(-2.0, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_voltage_step_hits_target() {
        let mut cell = CellModel::new(&config()).unwrap();
        let mut t = 0.0;
        for _ in 0..20 {
            t += 1.0;
            cell.solve_step(&cc(-1.0, 1.0, t)).unwrap();
        }
        let target = cell.voltage() - 0.01;
        let input = StepInput {
            control: StepControl::ConstantVoltage {
                target,
                initial_current: -1.0,
            },
            dt: 1.0,
            total_time: t + 1.0,
            cycle: 0,
            new_cycle: false,
        };
        let s = cell.solve_step(&input).unwrap();
        assert!((s.voltage - target).abs() < 1e-3);
        assert!(s.current < -1.0);
        assert!(s.cv_iterations >= 1);
    }

    #[test]
    fn test_throughput_accumulates_and_resets() {
        let mut cell = CellModel::new(&config()).unwrap();
        let mut t = 0.0;
        for _ in 0..10 {
            t += 2.0;
            cell.solve_step(&cc(-1.0, 2.0, t)).unwrap();
        }
        // The first interval starts from rest
        assert_relative_eq!(cell.throughput().discharge_capacity, 19.0, epsilon = 1e-9);

        let mut input = cc(-1.0, 2.0, t + 2.0);
        input.new_cycle = true;
        input.cycle = 1;
        cell.solve_step(&input).unwrap();
        assert_relative_eq!(cell.throughput().discharge_capacity, 2.0, epsilon = 1e-9);
        assert_relative_eq!(cell.counters().last_cycle().discharge_capacity, 19.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mass_and_volume_cover_all_layers() {
        let cell = CellModel::new(&config()).unwrap();
        let layers = 0.05 * (70e-6 + 80e-6 + 25e-6 + 15e-6 + 10e-6);
        assert_relative_eq!(cell.volume(), layers, max_relative = 1e-12);
        assert!(cell.mass() > 0.0);
    }

    #[test]
    fn test_adiabatic_discharge_heats() {
        let mut config = config();
        config.global.isothermal = false;
        config.global.a_exposed = 0.0;
        let mut cell = CellModel::new(&config).unwrap();
        let mut t = 0.0;
        let mut last = cell.temperature();
        for _ in 0..50 {
            t += 2.0;
            let s = cell.solve_step(&cc(-3.0, 2.0, t)).unwrap();
            assert!(s.temperature >= last);
            assert!(s.heat_generation > 0.0);
            last = s.temperature;
        }
        assert!(last > 298.15);
    }
}
