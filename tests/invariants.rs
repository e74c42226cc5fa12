//! Property-based checks of solver invariants

use proptest::prelude::*;
use spm_sim::cell::ThroughputCounter;
use spm_sim::electrode::{clamp_soc, DiffusionInput, ParticleDiffusion};
use spm_sim::timestepping::{DtContext, DtPolicy};
use spm_sim::{SolverMethod, Step, StopType};

proptest! {
    /// Kinetics never sees a SOC at or outside (0, 1)
    #[test]
    fn clamped_soc_is_strictly_inside_unit_interval(soc in -10.0f64..10.0) {
        let s = clamp_soc(soc);
        prop_assert!(s > 0.0 && s < 1.0);
    }

    /// Trapezoidal throughput of a constant current converges to |I|·Δt
    #[test]
    fn trapezoid_capacity_converges(
        current in -5.0f64..5.0,
        duration in 1.0f64..3600.0,
        n in 1usize..400,
    ) {
        prop_assume!(current.abs() > 1e-3);
        let dt = duration / n as f64;

        let mut steady = ThroughputCounter::new();
        let mut from_rest = ThroughputCounter::new();
        for i in 0..n {
            steady.accumulate(current, current, 3.7, 3.7, dt);
            let last = if i == 0 { 0.0 } else { current };
            from_rest.accumulate(current, last, 3.7, 3.7, dt);
        }

        let exact = current.abs() * duration;
        let steady_total = steady.cumulative().active_capacity(current);
        prop_assert!((steady_total - exact).abs() <= 1e-9 * exact);

        // Starting from rest loses half of the first interval
        let error = exact - from_rest.cumulative().active_capacity(current);
        prop_assert!(error >= -1e-9 * exact);
        prop_assert!(error <= 0.5 * current.abs() * dt + 1e-9 * exact);
    }

    /// The selected dt stays within the step maximum and lands on time stops
    #[test]
    fn dt_respects_step_limits(
        dt in 0.01f64..500.0,
        max_dt in 0.1f64..120.0,
        voltage in 2.5f64..4.5,
        dv in -0.1f64..0.1,
        current in -5.0f64..5.0,
        iterations in 0usize..20,
        stop_time in 1.0f64..7200.0,
        fraction in 0.0f64..0.999,
        constant_voltage in any::<bool>(),
    ) {
        let step = if constant_voltage {
            Step::cv(4.2, StopType::Time, stop_time, max_dt)
        } else {
            Step::cc(current, StopType::Time, stop_time, max_dt)
        };
        let step_time = fraction * stop_time;
        let ctx = DtContext {
            step: &step,
            constant_voltage,
            current,
            voltage,
            last_voltage: voltage - dv,
            cutoff_current: 0.1,
            step_iterations: iterations,
            step_time,
        };
        let policy = DtPolicy::default();
        let next = policy.next_dt(dt, &ctx);

        prop_assert!(next.dt > 0.0);
        prop_assert!(next.dt <= max_dt);
        prop_assert!(step_time + next.dt <= stop_time + 1e-9);

        // The same state at the start of the step gives the unclamped choice;
        // whenever that would overshoot, the step ends exactly on the stop
        let fresh = policy.next_dt(dt, &DtContext { step_time: 0.0, ..ctx });
        if step_time + fresh.dt >= stop_time {
            prop_assert!((step_time + next.dt - stop_time).abs() < 1e-9);
        }
    }

    /// Without surface flux a uniform particle stays uniform
    #[test]
    fn zero_flux_keeps_uniform_particle(
        soc0 in 0.01f64..0.99,
        dt in 0.1f64..100.0,
        fd in any::<bool>(),
    ) {
        let method = if fd {
            SolverMethod::FiniteDifference
        } else {
            SolverMethod::PolynomialApproximation
        };
        let mut particle = ParticleDiffusion::new(method, soc0, 5e-6, 49000.0);
        let average = particle.average_soc();
        let input = DiffusionInput {
            current_density: 0.0,
            last_current_density: 0.0,
            diffusivity: 1e-14,
            dt,
            total_time: dt,
        };
        let surface = particle.advance(&input).unwrap();
        prop_assert!((surface - soc0).abs() < 1e-9);
        prop_assert!((particle.average_soc() - average).abs() < 1e-9);
    }
}
