use crate::config::ElectrodeParams;
use crate::electrode::design::Composition;
use crate::electrode::diffusion::{DiffusionInput, ParticleDiffusion, SolverMethod};
use crate::electrode::kinetics::{
    butler_volmer_overpotential, clamp_soc, exchange_current_density, polarization_conductance,
};
use crate::electrode::sei::SeiFilm;
use crate::error::SimResult;
use crate::materials::{
    arrhenius, entropic_coefficient, ionic_conductivity, open_circuit_potential,
    solid_diffusivity, Arrhenius, Material,
};
use crate::state::StepHistory;

/// Which side of the cell an electrode sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectrodeKind {
    Cathode,
    Anode,
}

impl ElectrodeKind {
    /// Sign mapping the applied cell current to the intercalation current
    pub fn sign(&self) -> f64 {
        match self {
            ElectrodeKind::Cathode => 1.0,
            ElectrodeKind::Anode => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElectrodeKind::Cathode => "cathode",
            ElectrodeKind::Anode => "anode",
        }
    }
}

/// Operating conditions shared by both electrodes during one evaluation
#[derive(Debug, Clone, Copy)]
pub struct Conditions {
    /// Applied cell current (A), positive on charge
    pub applied_current: f64,
    /// Cell temperature (K)
    pub temperature: f64,
    /// Electrolyte concentration (mol/m³)
    pub ce: f64,
    /// Charge-transfer coefficient
    pub alpha: f64,
}

/// Single-particle porous electrode
///
/// Every trial evaluation reads only last-step snapshots, so the same time
/// step can be evaluated repeatedly (CV current search) before
/// [`commit_step`](Electrode::commit_step) accepts one of them.
#[derive(Debug, Clone)]
pub struct Electrode {
    kind: ElectrodeKind,
    material: Material,
    composition: Composition,
    area: f64,
    thickness: f64,
    diffusivity: Arrhenius,
    diffusivity_factor: f64,
    rate_constant: Arrhenius,
    ocp_offset: f64,
    diffusion: ParticleDiffusion,
    film: SeiFilm,
    /// Surface SOC
    soc: StepHistory<f64>,
    /// Intercalation current density J (A/m², surface basis)
    current_density: StepHistory<f64>,
    /// Side-reaction current density Js (A/m², surface basis)
    side_current: StepHistory<f64>,
    potential: StepHistory<f64>,
    overpotential: StepHistory<f64>,
}

impl Electrode {
    /// Build an electrode at rest at its initial SOC
    ///
    /// The initial potential is the open-circuit potential at `soc0` and
    /// `temperature`.
    pub fn new(kind: ElectrodeKind, params: &ElectrodeParams, temperature: f64) -> SimResult<Self> {
        let composition = Composition::from_params(params)?;
        let diffusion = ParticleDiffusion::new(
            params.solver,
            params.soc0,
            params.particle_radius,
            composition.cmax,
        );
        let phi0 = open_circuit_potential(
            params.material,
            clamp_soc(params.soc0),
            temperature,
            params.ocp_offset,
        )?;

        Ok(Self {
            kind,
            material: params.material,
            composition,
            area: params.area,
            thickness: params.thickness,
            diffusivity: params.ds,
            diffusivity_factor: params.ds_factor,
            rate_constant: params.kct,
            ocp_offset: params.ocp_offset,
            diffusion,
            film: SeiFilm::new(&params.sei),
            soc: StepHistory::new(params.soc0),
            current_density: StepHistory::new(0.0),
            side_current: StepHistory::new(0.0),
            potential: StepHistory::new(phi0),
            overpotential: StepHistory::new(0.0),
        })
    }

    /// Grow the SEI film from the last accepted side current
    pub fn update_film(&mut self, dt: f64) {
        self.film.grow(*self.side_current.last_step(), dt);
    }

    /// Evaluate the side-reaction current density for this trial
    pub fn update_side_reaction(&mut self, applied_current: f64, cycle: usize, temperature: f64) {
        let j_guess = self.kind.sign() * applied_current / self.composition.surface_area
            - self.side_current.last_step();
        let js = self.film.side_current_density(
            applied_current,
            cycle,
            *self.potential.last_step(),
            j_guess,
            temperature,
        );
        self.side_current.set(js);
    }

    /// Intercalation current density for `applied_current`, net of side reaction
    pub fn local_current_density(&self, applied_current: f64) -> f64 {
        self.kind.sign() * applied_current / self.composition.surface_area
            - self.side_current.present()
    }

    /// Solid diffusivity at `temperature`
    ///
    /// Materials with an SOC-dependent fit re-evaluate it at the last
    /// accepted surface SOC, scaled by the configured factor.
    pub fn diffusivity(&self, temperature: f64) -> f64 {
        match solid_diffusivity(self.material, *self.soc.last_step()) {
            Some(ds) => arrhenius(
                self.diffusivity_factor * ds,
                self.diffusivity.activation_energy,
                temperature,
            ),
            None => self.diffusivity.at(temperature),
        }
    }

    /// Advance the particle and return the new surface SOC
    pub fn advance_soc(
        &mut self,
        applied_current: f64,
        dt: f64,
        total_time: f64,
        temperature: f64,
    ) -> SimResult<f64> {
        let j = self.local_current_density(applied_current);
        self.current_density.set(j);
        let input = DiffusionInput {
            current_density: j,
            last_current_density: *self.current_density.last_step(),
            diffusivity: self.diffusivity(temperature),
            dt,
            total_time,
        };
        let soc = self.diffusion.advance(&input)?;
        self.soc.set(soc);
        Ok(soc)
    }

    fn exchange_current(&self, temperature: f64, ce: f64) -> f64 {
        exchange_current_density(
            self.rate_constant.at(temperature),
            self.composition.cmax,
            *self.soc.present(),
            ce,
        )
    }

    /// Electrode potential φ = η + Eref + J·R_sei
    pub fn update_potential(&mut self, conditions: &Conditions) -> SimResult<f64> {
        let j = self.local_current_density(conditions.applied_current);
        self.current_density.set(j);

        let i0 = self.exchange_current(conditions.temperature, conditions.ce);
        let eta = butler_volmer_overpotential(j, i0, conditions.alpha, conditions.temperature);
        let eref = open_circuit_potential(
            self.material,
            clamp_soc(*self.soc.present()),
            conditions.temperature,
            self.ocp_offset,
        )?;
        let phi = eta + eref + j * self.film.resistance();

        self.overpotential.set(eta);
        self.potential.set(phi);
        Ok(phi)
    }

    /// Open-circuit potential at the last accepted surface SOC
    pub fn open_circuit_potential_at(&self, temperature: f64) -> SimResult<f64> {
        open_circuit_potential(
            self.material,
            clamp_soc(*self.soc.last_step()),
            temperature,
            self.ocp_offset,
        )
    }

    /// Polarization plus film resistance on a geometric-area basis (Ω·m²)
    pub fn polarization_resistance(&self, conditions: &Conditions) -> f64 {
        let i0 = self.exchange_current(conditions.temperature, conditions.ce);
        let y = polarization_conductance(
            i0,
            *self.overpotential.present(),
            conditions.alpha,
            conditions.temperature,
        );
        (1.0 / y + self.film.resistance()) / self.composition.surface_area * self.area
    }

    /// Electrolyte resistance through half the electrode thickness (Ω)
    pub fn ohmic_resistance(&self, ce: f64, temperature: f64, bruggeman: f64) -> f64 {
        let sigma = ionic_conductivity(ce, temperature, bruggeman, self.composition.porosity);
        self.thickness / (2.0 * self.area * sigma)
    }

    /// dU/dT at the present surface SOC (V/K)
    pub fn entropic_coefficient(&self) -> SimResult<f64> {
        entropic_coefficient(self.material, clamp_soc(*self.soc.present()))
    }

    /// dU/dT at the last accepted surface SOC (V/K)
    pub fn last_entropic_coefficient(&self) -> SimResult<f64> {
        entropic_coefficient(self.material, clamp_soc(*self.soc.last_step()))
    }

    /// Accept the present evaluation
    pub fn commit_step(&mut self) {
        self.diffusion.commit_step();
        self.film.commit_step();
        self.soc.commit_step();
        self.current_density.commit_step();
        self.side_current.commit_step();
        self.potential.commit_step();
        self.overpotential.commit_step();
    }

    pub fn kind(&self) -> ElectrodeKind {
        self.kind
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn solver(&self) -> SolverMethod {
        self.diffusion.method()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn soc(&self) -> f64 {
        *self.soc.present()
    }

    pub fn last_soc(&self) -> f64 {
        *self.soc.last_step()
    }

    pub fn average_soc(&self) -> f64 {
        self.diffusion.average_soc()
    }

    pub fn profile(&self) -> Option<&[f64]> {
        self.diffusion.profile()
    }

    pub fn current_density(&self) -> f64 {
        *self.current_density.present()
    }

    pub fn side_current_density(&self) -> f64 {
        *self.side_current.present()
    }

    pub fn potential(&self) -> f64 {
        *self.potential.present()
    }

    pub fn overpotential(&self) -> f64 {
        *self.overpotential.present()
    }

    pub fn last_overpotential(&self) -> f64 {
        *self.overpotential.last_step()
    }

    pub fn film(&self) -> &SeiFilm {
        &self.film
    }

    /// Geometric area (m²)
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn volume(&self) -> f64 {
        self.composition.volume
    }

    pub fn mass(&self) -> f64 {
        self.composition.mass
    }
}
