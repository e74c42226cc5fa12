//! Charge and energy throughput counters
//!
//! Capacity and energy are integrated with the trapezoidal rule between the
//! last accepted sample and the present one, into discharge or charge
//! counters according to the sign of the present current.

use serde::Serialize;

use crate::utils::units::{amp_seconds_to_amp_hours, joules_to_watt_hours};

/// Trapezoidal area between two samples `dt` apart
#[inline]
pub fn trapezoid(a: f64, b: f64, dt: f64) -> f64 {
    0.5 * (a + b) * dt
}

/// Capacity (A·s) and energy (J) moved in each direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Throughput {
    pub discharge_capacity: f64,
    pub charge_capacity: f64,
    pub discharge_energy: f64,
    pub charge_energy: f64,
}

impl Throughput {
    /// Capacity in the direction of `current` (A·s); zero at rest
    pub fn active_capacity(&self, current: f64) -> f64 {
        if current < 0.0 {
            self.discharge_capacity
        } else if current > 0.0 {
            self.charge_capacity
        } else {
            0.0
        }
    }

    pub fn discharge_ah(&self) -> f64 {
        amp_seconds_to_amp_hours(self.discharge_capacity)
    }

    pub fn charge_ah(&self) -> f64 {
        amp_seconds_to_amp_hours(self.charge_capacity)
    }

    pub fn discharge_wh(&self) -> f64 {
        joules_to_watt_hours(self.discharge_energy)
    }

    pub fn charge_wh(&self) -> f64 {
        joules_to_watt_hours(self.charge_energy)
    }
}

/// Cumulative, last-cycle and nominal throughput of a cell
#[derive(Debug, Clone, Default)]
pub struct ThroughputCounter {
    cumulative: Throughput,
    last_cycle: Throughput,
    nominal_capacity: f64,
    nominal_energy: f64,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the step from (`last_current`, `last_voltage`) to (`current`, `voltage`)
    pub fn accumulate(
        &mut self,
        current: f64,
        last_current: f64,
        voltage: f64,
        last_voltage: f64,
        dt: f64,
    ) {
        if current < 0.0 {
            self.cumulative.discharge_capacity += trapezoid(-current, -last_current, dt);
            self.cumulative.discharge_energy +=
                trapezoid(-current * voltage, -last_current * last_voltage, dt);
        } else if current > 0.0 {
            self.cumulative.charge_capacity += trapezoid(current, last_current, dt);
            self.cumulative.charge_energy +=
                trapezoid(current * voltage, last_current * last_voltage, dt);
        }
    }

    /// Archive the finished cycle and zero the cumulative counters
    ///
    /// The discharge totals are latched as nominal values when cycle 2
    /// begins. Returns the archived totals.
    pub fn begin_cycle(&mut self, cycle: usize) -> Throughput {
        if cycle == 2 {
            self.nominal_capacity = self.cumulative.discharge_capacity;
            self.nominal_energy = self.cumulative.discharge_energy;
        }
        self.last_cycle = self.cumulative;
        self.cumulative = Throughput::default();
        self.last_cycle
    }

    pub fn cumulative(&self) -> &Throughput {
        &self.cumulative
    }

    pub fn last_cycle(&self) -> &Throughput {
        &self.last_cycle
    }

    /// Discharge capacity of the first full cycle (A·s), zero until latched
    pub fn nominal_capacity(&self) -> f64 {
        self.nominal_capacity
    }

    /// Discharge energy of the first full cycle (J), zero until latched
    pub fn nominal_energy(&self) -> f64 {
        self.nominal_energy
    }
}
