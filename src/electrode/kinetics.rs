//! Butler–Volmer charge-transfer kinetics
//!
//! Symmetric Butler–Volmer relation between the intercalation current
//! density J and the surface overpotential η:
//!
//! ```text
//! J = i0·(exp(αFη/RT) − exp(−αFη/RT))
//! i0 = F·k·sqrt(cmax·(1 − soc))·sqrt(cmax·soc)·sqrt(ce)
//! ```
//!
//! With x = exp(αFη/RT) this is the quadratic x² − (J/i0)·x − 1 = 0, whose
//! positive root gives η in closed form.

use tracing::warn;

use crate::utils::units::{FARADAY, GAS_CONSTANT};

/// Lower bound of the SOC used inside the exchange current density
pub const SOC_MIN: f64 = 1e-5;
/// Upper bound of the SOC used inside the exchange current density
pub const SOC_MAX: f64 = 0.99999;

/// Clamp an SOC into [`SOC_MIN`], [`SOC_MAX`]
///
/// Keeps the square roots of the exchange current density real and nonzero
/// when the surface is driven slightly past full or empty.
pub fn clamp_soc(soc: f64) -> f64 {
    soc.clamp(SOC_MIN, SOC_MAX)
}

/// Exchange current density (A/m², surface basis)
///
/// # Arguments
/// * `rate_constant` - Temperature-corrected kinetic rate constant
/// * `cmax` - Maximum lithium concentration (mol/m³)
/// * `soc` - Surface SOC, clamped internally
/// * `ce` - Electrolyte concentration (mol/m³)
pub fn exchange_current_density(rate_constant: f64, cmax: f64, soc: f64, ce: f64) -> f64 {
    let soc = clamp_soc(soc);
    FARADAY
        * rate_constant
        * (cmax * (1.0 - soc)).sqrt()
        * (cmax * soc).sqrt()
        * ce.sqrt()
}

/// Overpotential (V) that drives `current_density` through the interface
pub fn butler_volmer_overpotential(
    current_density: f64,
    i0: f64,
    alpha: f64,
    temperature: f64,
) -> f64 {
    let c1 = current_density / (2.0 * i0);
    let c2 = (current_density * current_density + 4.0 * i0 * i0).sqrt() / (2.0 * i0);
    let lower = c1 - c2;
    let upper = c1 + c2;
    if lower / upper > 0.0 {
        warn!(
            current_density,
            i0, "Butler-Volmer roots share a sign, overpotential may be wrong"
        );
    }
    let x = lower.max(upper);
    GAS_CONSTANT * temperature / (alpha * FARADAY) * x.ln()
}

/// dJ/dη at the operating point (S/m², surface basis)
pub fn polarization_conductance(i0: f64, overpotential: f64, alpha: f64, temperature: f64) -> f64 {
    let f = alpha * FARADAY / (GAS_CONSTANT * temperature);
    i0 * f * ((f * overpotential).exp() + (-f * overpotential).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const T: f64 = 298.15;

    fn current_from_overpotential(eta: f64, i0: f64, alpha: f64) -> f64 {
        let f = alpha * FARADAY / (GAS_CONSTANT * T);
        i0 * ((f * eta).exp() - (-f * eta).exp())
    }

    #[test]
    fn test_zero_current_zero_overpotential() {
        assert_relative_eq!(butler_volmer_overpotential(0.0, 2.0, 0.5, T), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_overpotential_inverts_butler_volmer() {
        let i0 = 1.3;
        for &j in &[-10.0, -0.4, 0.02, 0.9, 25.0] {
            let eta = butler_volmer_overpotential(j, i0, 0.5, T);
            assert_relative_eq!(current_from_overpotential(eta, i0, 0.5), j, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_overpotential_is_odd_in_current() {
        let a = butler_volmer_overpotential(3.0, 0.7, 0.5, T);
        let b = butler_volmer_overpotential(-3.0, 0.7, 0.5, T);
        assert_relative_eq!(a, -b, epsilon = 1e-12);
        assert!(a > 0.0);
    }

    #[test]
    fn test_exchange_current_peaks_at_half() {
        let mid = exchange_current_density(5e-11, 49188.0, 0.5, 1000.0);
        let low = exchange_current_density(5e-11, 49188.0, 0.1, 1000.0);
        let high = exchange_current_density(5e-11, 49188.0, 0.9, 1000.0);
        assert!(mid > low && mid > high);
        assert_relative_eq!(low, high, max_relative = 1e-12);
    }

    #[test]
    fn test_exchange_current_clamps_soc() {
        let at_one = exchange_current_density(5e-11, 49188.0, 1.0, 1000.0);
        let past_one = exchange_current_density(5e-11, 49188.0, 1.2, 1000.0);
        assert!(at_one > 0.0);
        assert_eq!(at_one, past_one);
        assert!(exchange_current_density(5e-11, 49188.0, -0.1, 1000.0) > 0.0);
    }

    #[test]
    fn test_conductance_matches_linear_limit() {
        // Near equilibrium dJ/dη = 2·i0·αF/RT
        let i0 = 0.8;
        let g = polarization_conductance(i0, 0.0, 0.5, T);
        assert_relative_eq!(g, 2.0 * i0 * 0.5 * FARADAY / (GAS_CONSTANT * T), max_relative = 1e-12);
    }
}
