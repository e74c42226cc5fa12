pub mod design;
pub mod diffusion;
#[allow(clippy::module_inception)]
pub mod electrode;
pub mod kinetics;
pub mod sei;

pub use design::Composition;
pub use diffusion::{DiffusionInput, ParticleDiffusion, SolverMethod, GRID_POINTS};
pub use electrode::{Conditions, Electrode, ElectrodeKind};
pub use kinetics::{clamp_soc, SOC_MAX, SOC_MIN};
pub use sei::SeiFilm;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::config::{ElectrodeParams, SeiParams};
    use crate::electrode::SolverMethod;
    use crate::materials::{Arrhenius, Material};

    pub fn nmc_params() -> ElectrodeParams {
        ElectrodeParams {
            material: Material::Nmc,
            solver: SolverMethod::FiniteDifference,
            thickness: 70e-6,
            area: 0.05,
            apparent_density: 3.0,
            mass_frac_am: 0.9,
            mass_frac_carbon: 0.05,
            particle_radius: 5e-6,
            capacity: None,
            ds: Arrhenius::constant(1e-14),
            ds_factor: 1.0,
            kct: Arrhenius::constant(5e-11),
            soc0: 0.42,
            ocp_offset: 0.0,
            sei: SeiParams::default(),
        }
    }

    pub fn mcmb2_params() -> ElectrodeParams {
        ElectrodeParams {
            material: Material::Mcmb2,
            solver: SolverMethod::FiniteDifference,
            thickness: 80e-6,
            area: 0.05,
            apparent_density: 1.5,
            mass_frac_am: 0.92,
            mass_frac_carbon: 0.02,
            particle_radius: 8e-6,
            capacity: None,
            ds: Arrhenius::constant(3.9e-14),
            ds_factor: 1.0,
            kct: Arrhenius::constant(5e-11),
            soc0: 0.85,
            ocp_offset: 0.0,
            sei: SeiParams {
                i0s: Arrhenius::constant(1.5e-6),
                erefs: 0.4,
                ms: 0.162,
                rhos: 1690.0,
                lsei: 5e-9,
                lsei0: None,
                ks: 5e-6,
                rsei: 0.0,
            },
        }
    }
}
