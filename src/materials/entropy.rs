//! Entropic coefficient dU/dT tables
//!
//! Tabulated (SOC, dU/dT) pairs in V/K, interpolated piecewise-linearly.
//! NMC after Jeon (2011) (of doubtful quality), LCO after Jeon (2011),
//! graphite shared by MCMB1, MCMB2 and LMnO. NCA has no table and is
//! treated as entropy-neutral.

use crate::error::{SimError, SimResult};
use crate::materials::Material;

const NMC_SOC: [f64; 21] = [
    0.0, 0.02, 0.055, 0.09, 0.122, 0.166, 0.218,
    0.247, 0.299, 0.349, 0.378, 0.419, 0.5, 0.576,
    0.628, 0.701, 0.75, 0.805, 0.875, 0.936, 1.0,
];

const NMC_DUDT: [f64; 21] = [
    -0.000110598, -0.000102285, -9.39628e-05, -9.05218e-05, -8.96616e-05, -8.93714e-05, -8.96616e-05,
    -8.8791e-05, -8.59305e-05, -8.04788e-05, -7.73177e-05, -7.15863e-05, -6.0683e-05, -5.40809e-05,
    -5.20703e-05, -5.35109e-05, -5.66617e-05, -6.09628e-05, -6.69949e-05, -7.30165e-05, -7.96186e-05,
];

const LCO_SOC: [f64; 34] = [
    0.501, 0.506, 0.512, 0.519, 0.526, 0.531, 0.534,
    0.54, 0.551, 0.553, 0.557, 0.563, 0.569, 0.582,
    0.585, 0.612, 0.646, 0.665, 0.707, 0.719, 0.771,
    0.81, 0.847, 0.881, 0.903, 0.928, 0.957, 0.968,
    0.981, 0.994, 0.997, 0.988, 0.994, 1.0,
];

const LCO_DUDT: [f64; 34] = [
    -0.000312214, -0.000394787, -0.000394787, -0.000329419, -0.000198684, -8.85941e-05, 2.15059e-05,
    0.000124714, 0.000159123, 0.000131596, 6.96689e-05, 8.60237e-07, -9.89169e-05, -0.000150521,
    -0.000174597, -0.000212448, -0.00025717, -0.000277815, -0.00033286, -0.000350065, -0.000456713,
    -0.000539286, -0.000570254, -0.000597772, -0.000611535, -0.000614976, -0.000614976, -0.000525522,
    -0.000453273, -0.000456713, -0.000470477, -0.000456713, -0.000463595, -0.000470477,
];

const GRAPHITE_SOC: [f64; 57] = [
    0.005, 0.007, 0.01, 0.012, 0.016, 0.017, 0.024,
    0.028, 0.031, 0.033, 0.037, 0.038, 0.04, 0.042,
    0.043, 0.045, 0.047, 0.049, 0.05, 0.054, 0.056,
    0.059, 0.061, 0.064, 0.07, 0.077, 0.087, 0.099,
    0.11, 0.122, 0.134, 0.146, 0.165, 0.181, 0.193,
    0.205, 0.217, 0.231, 0.242, 0.257, 0.292, 0.32,
    0.351, 0.379, 0.403, 0.416, 0.428, 0.438, 0.449,
    0.468, 0.478, 0.487, 0.497, 0.504, 0.517, 0.532,
    0.798,
];

const GRAPHITE_DUDT: [f64; 57] = [
    2.5e-05, 3.4e-05, 4.6e-05, 6.1e-05, 7.8e-05, 9.9e-05, 0.000136,
    0.000168, 0.000196, 0.00021, 0.000228, 0.00024, 0.000245, 0.000251,
    0.000254, 0.000256, 0.0002541, 0.000249, 0.000244, 0.000233, 0.000224,
    0.000207, 0.000182, 0.000157, 0.00012, 8.7e-05, 4.3e-05, 8e-06,
    -1.3e-05, -3.3e-05, -4.7e-05, -5.9e-05, -7.5e-05, -9.4e-05, -0.000108,
    -0.000128, -0.000142, -0.000158, -0.000167, -0.000174, -0.00017, -0.000168,
    -0.000172, -0.000174, -0.0001722, -0.000167, -0.00016, -0.000152, -0.000145,
    -0.000137, -0.000133, -0.000126, -0.000115, -0.000107, -0.000101, -0.0001,
    -0.00011,
];

/// Entropic coefficient dU/dT (V/K) of an active material at `soc`
pub fn entropic_coefficient(material: Material, soc: f64) -> SimResult<f64> {
    match material {
        Material::Nmc => Ok(interp(soc, &NMC_SOC, &NMC_DUDT)),
        Material::Lco => Ok(interp(soc, &LCO_SOC, &LCO_DUDT)),
        Material::Lmno | Material::Mcmb1 | Material::Mcmb2 => {
            Ok(interp(soc, &GRAPHITE_SOC, &GRAPHITE_DUDT))
        }
        Material::Nca => Ok(0.0),
        other => Err(SimError::MissingProperty {
            material: other.as_str(),
            property: "entropic coefficient",
        }),
    }
}

/// Piecewise-linear interpolation with constant extrapolation
///
/// Returns `fp[0]` left of the table and the last value right of it. The
/// first segment `[xp[i], xp[i+1]]` containing `x` wins, which keeps the
/// result defined for tables whose abscissae are not strictly increasing.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    if xp.is_empty() {
        return 0.0;
    }
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    for i in 0..last {
        let (x0, x1) = (xp[i], xp[i + 1]);
        if x1 > x0 && x >= x0 && x <= x1 {
            let w = (x - x0) / (x1 - x0);
            return fp[i] + w * (fp[i + 1] - fp[i]);
        }
    }
    fp[last]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interp_nodes_and_midpoints() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 0.0];
        assert_relative_eq!(interp(1.0, &xp, &fp), 10.0);
        assert_relative_eq!(interp(0.25, &xp, &fp), 2.5);
        assert_relative_eq!(interp(1.5, &xp, &fp), 5.0);
    }

    #[test]
    fn test_interp_extrapolates_flat() {
        let xp = [0.2, 0.8];
        let fp = [1.0, 3.0];
        assert_eq!(interp(-1.0, &xp, &fp), 1.0);
        assert_eq!(interp(5.0, &xp, &fp), 3.0);
    }

    #[test]
    fn test_graphite_table_shared() {
        let a = entropic_coefficient(Material::Mcmb2, 0.3).unwrap();
        let b = entropic_coefficient(Material::Lmno, 0.3).unwrap();
        assert_eq!(a, b);
        // 0.3 lies between 0.292 and 0.32
        assert!(a < -1.6e-4 && a > -1.72e-4);
    }

    #[test]
    fn test_nmc_table_endpoints() {
        assert_relative_eq!(entropic_coefficient(Material::Nmc, 0.0).unwrap(), -0.000110598);
        assert_relative_eq!(entropic_coefficient(Material::Nmc, 1.0).unwrap(), -7.96186e-05);
    }

    #[test]
    fn test_lco_non_monotone_tail() {
        let v = entropic_coefficient(Material::Lco, 0.999).unwrap();
        assert!(v < -4.6e-4 && v > -4.71e-4);
    }

    #[test]
    fn test_inactive_material_has_no_entropy() {
        assert!(entropic_coefficient(Material::Separator, 0.5).is_err());
        assert_eq!(entropic_coefficient(Material::Nca, 0.5).unwrap(), 0.0);
    }
}
