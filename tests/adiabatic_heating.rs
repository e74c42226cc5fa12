mod common;

use spm_sim::{HeatSources, Step, StopType};

#[test]
fn test_adiabatic_self_heating() {
    let mut config = common::single_pass(vec![Step::cc(-3.0, StopType::Time, 600.0, 5.0)]);
    config.global.isothermal = false;
    config.global.a_exposed = 0.0;
    let (driver, summary, samples) = common::run(&config);

    let last = samples.last().unwrap();
    assert!((last.total_time - 600.0).abs() < 1e-9);
    assert!((last.step_time - 600.0).abs() < 1e-9);
    assert_eq!(summary.cycles.len(), 1);

    for pair in samples.windows(2) {
        assert!(
            pair[1].temperature >= pair[0].temperature,
            "temperature fell at t = {}",
            pair[1].total_time
        );
    }
    assert!(samples.iter().all(|s| s.heat_generation > 0.0));

    let rise = last.temperature - 298.15;
    assert!(rise > 1.0 && rise < 20.0, "temperature rise {} K", rise);

    // Kinetic and ohmic heat are both positive on discharge
    let cell = driver.cell();
    assert!(cell.cathode().overpotential() < 0.0);
    assert!(cell.anode().overpotential() > 0.0);
    let t = cell.temperature();
    let ohmic = HeatSources {
        current: -3.0,
        ohmic_resistance: cell.ohmic_resistance(t),
        ..HeatSources::default()
    };
    assert!(ohmic.volumetric(t, cell.volume()) > 0.0);
    let kinetic = HeatSources {
        current: -3.0,
        cathode_overpotential: cell.cathode().overpotential(),
        anode_overpotential: cell.anode().overpotential(),
        ..HeatSources::default()
    };
    assert!(kinetic.volumetric(t, cell.volume()) > 0.0);
}

#[test]
fn test_isothermal_cell_keeps_temperature() {
    let config = common::single_pass(vec![Step::cc(-3.0, StopType::Time, 120.0, 5.0)]);
    let (_, _, samples) = common::run(&config);
    assert!(samples.iter().all(|s| s.temperature == 298.15));
    assert!(samples.iter().all(|s| s.heat_generation > 0.0));
}

#[test]
fn test_convective_cell_heats_less() {
    let mut adiabatic = common::single_pass(vec![Step::cc(-3.0, StopType::Time, 300.0, 5.0)]);
    adiabatic.global.isothermal = false;
    adiabatic.global.a_exposed = 0.0;
    let mut cooled = adiabatic.clone();
    cooled.global.a_exposed = 0.05;
    cooled.global.h = 50.0;

    let (_, a, _) = common::run(&adiabatic);
    let (_, c, _) = common::run(&cooled);
    assert!(c.final_temperature < a.final_temperature);
    assert!(c.final_temperature > 298.15);
}
