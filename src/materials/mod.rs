//! Material property lookups
//!
//! Pure functions keyed by a [`Material`] tag: densities, theoretical
//! capacities, open-circuit potential fits, entropic coefficients,
//! diffusivity and electrolyte conductivity. No state.

pub mod material;
pub mod entropy;
pub mod ocp;
pub mod transport;

pub use material::Material;
pub use entropy::{entropic_coefficient, interp};
pub use ocp::{open_circuit_potential, reference_potential};
pub use transport::{arrhenius, ionic_conductivity, solid_diffusivity, Arrhenius};
