//! Physical constants and unit conversions for electrochemical modelling
//!
//! Faraday and gas constants plus the temperature, charge, energy and
//! flow conversions used by the models.

// ============================================================================
// Constants
// ============================================================================

/// Faraday constant (C/mol)
pub const FARADAY: f64 = 96485.0;

/// Universal gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.3145;

/// Reference temperature for Arrhenius scaling and OCP fits (K)
pub const REFERENCE_TEMPERATURE: f64 = 298.0;

/// Offset between degrees Celsius and Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;

/// Seconds per hour
pub const SECONDS_PER_HOUR: f64 = 3600.0;

// ============================================================================
// Temperature
// ============================================================================

/// Convert degrees Celsius to Kelvin
///
/// # Examples
/// ```
/// use spm_sim::utils::units::celsius_to_kelvin;
/// assert_eq!(celsius_to_kelvin(25.0), 298.15);
/// ```
#[inline]
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

/// Convert Kelvin to degrees Celsius
#[inline]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

// ============================================================================
// Charge and energy
// ============================================================================

/// Convert ampere-seconds (coulombs) to ampere-hours
#[inline]
pub fn amp_seconds_to_amp_hours(amp_seconds: f64) -> f64 {
    amp_seconds / SECONDS_PER_HOUR
}

/// Convert ampere-hours to ampere-seconds
#[inline]
pub fn amp_hours_to_amp_seconds(amp_hours: f64) -> f64 {
    amp_hours * SECONDS_PER_HOUR
}

/// Convert joules (W·s) to watt-hours
#[inline]
pub fn joules_to_watt_hours(joules: f64) -> f64 {
    joules / SECONDS_PER_HOUR
}

/// Convert a specific capacity in mAh/g to C/g
#[inline]
pub fn mah_per_gram_to_coulombs_per_gram(mah_per_gram: f64) -> f64 {
    mah_per_gram * SECONDS_PER_HOUR / 1000.0
}

/// Convert litres per minute to m³/s
#[inline]
pub fn lpm_to_cubic_meters_per_second(lpm: f64) -> f64 {
    lpm / 1000.0 / 60.0
}
