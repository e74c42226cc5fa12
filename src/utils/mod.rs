//! Utility modules shared across the cell models

pub mod units;

// Re-export commonly used items
pub use units::{
    FARADAY, GAS_CONSTANT, REFERENCE_TEMPERATURE, KELVIN_OFFSET, SECONDS_PER_HOUR,
    celsius_to_kelvin, kelvin_to_celsius,
    amp_seconds_to_amp_hours, amp_hours_to_amp_seconds, joules_to_watt_hours,
    mah_per_gram_to_coulombs_per_gram, lpm_to_cubic_meters_per_second,
};
