mod common;

use spm_sim::{Step, StopType};

#[test]
fn test_cc_discharge_to_cutoff() {
    let config = common::single_pass(vec![Step::cc(-1.0, StopType::Voltage, 3.0, 2.0)]);
    let (driver, summary, samples) = common::run(&config);

    assert!(samples.len() > 100);
    let ocv = {
        let cell = spm_sim::CellModel::new(&config).unwrap();
        cell.voltage()
    };
    assert!(samples[0].voltage < ocv);

    // Voltage falls throughout the discharge
    for pair in samples.windows(2) {
        assert!(
            pair[1].voltage <= pair[0].voltage + 1e-4,
            "voltage rose from {} to {} at t = {}",
            pair[0].voltage,
            pair[1].voltage,
            pair[1].total_time
        );
        assert!(pair[1].total_time - pair[0].total_time <= 2.0 + 1e-9);
        assert!(pair[1].discharge_capacity >= pair[0].discharge_capacity);
        assert!(pair[1].cathode_soc >= pair[0].cathode_soc - 1e-9);
        assert!(pair[1].anode_soc <= pair[0].anode_soc + 1e-9);
    }

    // Only the last sample is at or below the cutoff
    let (last, rest) = samples.split_last().unwrap();
    assert!(last.voltage <= 3.0);
    assert!(rest.iter().all(|s| s.voltage > 3.0));
    assert!(samples.iter().all(|s| s.current == -1.0 && s.step == 0 && s.cycle == 0));
    assert_eq!(last.charge_capacity, 0.0);

    // Step advance wrapped the single-step schedule into cycle 1
    assert_eq!(driver.schedule().cycle(), 1);
    assert_eq!(driver.schedule().step_index(), 0);
    assert_eq!(summary.cycles.len(), 1);
    let delivered = summary.cycles[0].discharge_ah;
    assert!(delivered > 1.3 && delivered < 1.7, "delivered {} Ah", delivered);
    assert!((delivered - last.discharge_capacity / 3600.0).abs() < 1e-9);
    assert!(summary.cycles[0].discharge_wh > 3.0 * delivered);
}

#[test]
fn test_internal_resistance_is_reported() {
    let config = common::single_pass(vec![Step::cc(-1.0, StopType::Time, 60.0, 2.0)]);
    let (driver, _, samples) = common::run(&config);
    let ohmic = driver.cell().ohmic_resistance(298.15);
    assert!(samples.iter().all(|s| s.internal_resistance > ohmic));
    assert!(samples.iter().all(|s| (s.temperature - 298.15).abs() < 1e-12));
}

#[test]
fn test_pa_and_fd_deliver_similar_capacity() {
    let mut fd = common::single_pass(vec![Step::cc(-1.0, StopType::Voltage, 3.0, 5.0)]);
    fd.positive.solver = spm_sim::SolverMethod::FiniteDifference;
    fd.negative.solver = spm_sim::SolverMethod::FiniteDifference;
    let mut pa = fd.clone();
    pa.positive.solver = spm_sim::SolverMethod::PolynomialApproximation;
    pa.negative.solver = spm_sim::SolverMethod::PolynomialApproximation;

    let (_, fd_summary, _) = common::run(&fd);
    let (_, pa_summary, _) = common::run(&pa);
    let a = fd_summary.cycles[0].discharge_ah;
    let b = pa_summary.cycles[0].discharge_ah;
    assert!((a - b).abs() / a < 0.05, "fd {} Ah, pa {} Ah", a, b);
}

#[test]
fn test_time_stops_close_their_budget_exactly() {
    let config = common::single_pass(vec![
        Step::cc(-1.0, StopType::Time, 60.0, 7.0),
        Step::cc(0.0, StopType::Time, 30.0, 7.0),
    ]);
    let (_, summary, samples) = common::run(&config);

    for (step, budget) in [(0, 60.0), (1, 30.0)] {
        let in_step: Vec<_> = samples.iter().filter(|s| s.step == step).collect();
        assert!(in_step.len() > 5);
        assert!(in_step.iter().all(|s| s.step_time <= budget + 1e-9));
        let last = in_step[in_step.len() - 1];
        assert!(
            (last.step_time - budget).abs() < 1e-9,
            "step {} ended at {} s",
            step,
            last.step_time
        );
    }
    assert!((summary.total_time - 90.0).abs() < 1e-9);
}
