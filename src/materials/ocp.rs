//! Open-circuit potential fits
//!
//! Each active material has a closed-form fit of Eref(SOC) at the reference
//! temperature, valid over a limited SOC window. Below that window the SOC
//! is clamped and a warning is emitted. The temperature correction is the
//! entropic coefficient times (T - 298 K).

use tracing::warn;

use crate::error::{SimError, SimResult};
use crate::materials::{entropic_coefficient, Material};
use crate::utils::units::REFERENCE_TEMPERATURE;

/// Lowest SOC for which the LCO fit is usable
pub const LCO_MIN_SOC: f64 = 0.43;

/// Lowest SOC for which the MCMB2 fit is usable
pub const MCMB2_MIN_SOC: f64 = 0.006;

/// Bounds of the MCMB1 potential (V)
const MCMB1_MIN_POTENTIAL: f64 = 1e-6;
const MCMB1_MAX_POTENTIAL: f64 = 1.2;

/// Open-circuit potential (V vs Li/Li+) at `soc` and `temperature` (K)
///
/// # Arguments
/// * `material` - Active material tag
/// * `soc` - State of charge of the particle surface
/// * `temperature` - Temperature (K)
/// * `offset` - Constant correction added to the fit (V)
///
/// # Returns
/// Eref(soc) + offset + (T - 298)·dU/dT(soc)
pub fn open_circuit_potential(
    material: Material,
    soc: f64,
    temperature: f64,
    offset: f64,
) -> SimResult<f64> {
    let base = reference_potential(material, soc)?;
    let entropy = entropic_coefficient(material, soc)?;
    Ok(base + offset + (temperature - REFERENCE_TEMPERATURE) * entropy)
}

/// Open-circuit potential at the reference temperature, without offset
pub fn reference_potential(material: Material, soc: f64) -> SimResult<f64> {
    match material {
        Material::Nmc => Ok(nmc(soc)),
        Material::Nca => Ok(nca(soc)),
        Material::Lco => Ok(lco(soc)),
        Material::Mcmb1 => Ok(mcmb1(soc)),
        Material::Mcmb2 => Ok(mcmb2(soc)),
        other => Err(SimError::MissingProperty {
            material: other.as_str(),
            property: "open-circuit potential",
        }),
    }
}

fn nmc(soc: f64) -> f64 {
    const X: [f64; 7] = [
        3.125766183885334,
        -5.763342952859494,
        2.124454409988303,
        0.51324615231389,
        -1.999566459156232,
        0.992457700580878,
        0.007158221269832,
    ];
    let s2 = soc * soc;
    let s3 = s2 * soc;
    (X[0] * s3 + X[1] * s2 + X[2] * soc + X[3]) / (s3 + X[4] * s2 + X[5] * soc + X[6])
}

fn nca(soc: f64) -> f64 {
    const X: [f64; 9] = [
        -47.09304396,
        -2.64754588,
        -71.38533023,
        -800.63158077,
        -340.36135014,
        1284.86452671,
        -429.83691774,
        204.34231731,
        233.74192887,
    ];
    let s2 = soc * soc;
    let s3 = s2 * soc;
    let s4 = s3 * soc;
    let s5 = s4 * soc;
    (X[0] * s5 + X[1] * s4 + X[2] * s3 + X[3] * s2 + X[4] * soc + X[5])
        / (s3 + X[6] * s2 + X[7] * soc + X[8])
}

fn lco(soc: f64) -> f64 {
    const X: [f64; 12] = [
        -4.656, 88.669, -401.119, 342.909, -462.471, 433.434, -1.0, 18.933, -79.532, 37.311,
        -73.083, 95.96,
    ];
    let soc = if soc < LCO_MIN_SOC {
        warn!(soc, "SOC below LCO fit range, clamping to {}", LCO_MIN_SOC);
        LCO_MIN_SOC
    } else {
        soc
    };
    // Even powers of soc up to 10
    let p: Vec<f64> = (0..6).map(|k| soc.powi(2 * k)).collect();
    let num: f64 = (0..6).map(|k| X[k] * p[k]).sum();
    let den: f64 = (0..6).map(|k| X[6 + k] * p[k]).sum();
    num / den
}

fn mcmb1(soc: f64) -> f64 {
    let e = -0.16 + 1.32 * (-3.0 * soc).exp() + 10.0 * (-2000.0 * soc).exp();
    if e > MCMB1_MAX_POTENTIAL {
        MCMB1_MAX_POTENTIAL
    } else if e < 0.0 {
        MCMB1_MIN_POTENTIAL
    } else {
        e
    }
}

fn mcmb2(soc: f64) -> f64 {
    const X: [f64; 7] = [0.7222, 0.1387, 0.029, -0.0172, 0.0019, 0.2808, -0.7984];
    let soc = if soc < MCMB2_MIN_SOC {
        warn!(soc, "SOC below MCMB2 fit range, clamping to {}", MCMB2_MIN_SOC);
        MCMB2_MIN_SOC
    } else {
        soc
    };
    X[0] + X[1] * soc + X[2] * soc.sqrt() + X[3] / soc + X[4] / soc.powf(1.5)
        + X[5] * (0.9 - 15.0 * soc).exp()
        + X[6] * (0.4465 * soc - 0.4108).exp()
}
