//! Full diauxic growth run, glucose is consumed first and acetate afterwards
#![cfg(feature = "minilp")]
mod common;

use approx::assert_relative_eq;
use dfbars_core::configuration::Solver;
use dfbars_core::dfba::accumulator::UniquenessSummary;
use dfbars_core::dfba::coupler::{CouplerState, DfbaCoupler};
use dfbars_core::dfba::settings::SimulationSettingsBuilder;

use common::{diauxic_bindings, diauxic_fba, diauxic_reactor};

#[test]
fn diauxic_growth() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut fba = diauxic_fba(Solver::Microlp);
    let mut reactor = diauxic_reactor(10.8, 0.001);
    let mut coupler = DfbaCoupler::new(&mut fba, &mut reactor, diauxic_bindings()).unwrap();
    let settings = SimulationSettingsBuilder::default()
        .tend(10.)
        .dt(0.1)
        .build()
        .unwrap();

    let outcome = coupler.simulate(&settings).unwrap();
    assert!(outcome.is_complete(), "{:?}", outcome.failure());
    assert_eq!(coupler.state(), CouplerState::Terminated);
    let trace = outcome.into_trace();
    assert_eq!(trace.len(), 101);
    assert_relative_eq!(trace.times()[100], 10., epsilon = 1e-9);
    assert!(trace.simulation_time.is_some());

    let glucose = trace.species("Glcxt").unwrap();
    let biomass = trace.species("X").unwrap();
    let uptake = trace.flux("EX_Glcxt").unwrap();
    let growth = trace.objective_values();
    assert_relative_eq!(glucose[0], 10.8);
    assert_relative_eq!(biomass[0], 0.001);
    assert!(growth[0] > 1e-6);

    for step in 0..trace.len() - 1 {
        assert!(uptake[step] <= 1e-9, "glucose secreted at step {step}");
        assert!(glucose[step + 1] <= glucose[step] + 1e-9);
        assert!(biomass[step + 1] >= biomass[step] - 1e-12);
        if growth[step] > 1e-6 {
            assert!(biomass[step + 1] > biomass[step], "no growth at step {step}");
        }
    }
    // Yield on glucose is at most 1 / 9.46, on acetate 1 / 39.43
    assert!(biomass[100] > biomass[0]);
    assert!(biomass[100] < 1.2);

    for record in &trace.records {
        assert!(record.state.iter().all(|v| *v >= 0.));
        assert!(record.bounds.iter().all(|b| b.lower <= b.upper));
    }
    // Glucose uptake never exceeds the saturating kinetics
    for (bounds, pool) in trace.bounds("EX_Glcxt").unwrap().iter().zip(&glucose) {
        assert!(bounds.lower >= -10. * pool / (0.015 + pool) - 1e-9);
    }

    assert_eq!(trace.optimality_ranges.len(), 101);
    assert!(trace.optimality_ranges.iter().all(Option::is_some));
    assert!(!matches!(
        trace.uniqueness_summary(),
        UniquenessSummary::Unchecked
    ));
}

#[test]
fn flux_columns_hold_optimized_fluxes() {
    let mut fba = diauxic_fba(Solver::Microlp);
    let mut reactor = diauxic_reactor(10.8, 0.001);
    let mut coupler = DfbaCoupler::new(&mut fba, &mut reactor, diauxic_bindings()).unwrap();
    let settings = SimulationSettingsBuilder::default()
        .tend(1.)
        .dt(0.1)
        .check_uniqueness(false)
        .build()
        .unwrap();

    let trace = coupler.simulate(&settings).unwrap().into_trace();
    for reaction in ["EX_Ac", "EX_Glcxt", "EX_O2", "EX_X"] {
        assert_eq!(
            trace.flux_column(reaction).unwrap(),
            trace.flux(reaction).unwrap()
        );
    }
    // The reactor itself reports rates scaled by biomass, not fluxes
    let uptake = trace.flux("EX_Glcxt").unwrap();
    assert!(uptake[0] < -1.);
}
