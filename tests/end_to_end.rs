use approx::assert_relative_eq;
use squad_sopt::{
    postprocessor::{check_consistency, ConsistencyWarning},
    second_order_calculation, Calculation, Configuration, ModelParameters,
};

fn configuration() -> Configuration {
    let mut configuration = Configuration::default();
    configuration.grid.step = 0.02;
    configuration.grid.exponent = 12;
    configuration.outer_loop.tolerance = 1e-7;
    configuration.outer_loop.root_tolerance = 1e-10;
    configuration
}

fn calculate(interaction: f64, level: f64, phase_over_pi: f64) -> Calculation {
    let parameters =
        ModelParameters::from_reduced(interaction, 1., 0.5, 1., level, phase_over_pi).unwrap();
    second_order_calculation(&parameters, &configuration()).unwrap()
}

#[test]
fn non_interacting_solution_is_the_mean_field_solution() {
    let calculation = calculate(0., 0., 0.);
    assert!(calculation.self_energy.is_identically_zero());
    assert_relative_eq!(
        calculation.bound_state_energy(),
        calculation.hartree_fock.bound_state_energy(),
        epsilon = 1e-10
    );
    let hartree_fock = calculation
        .hartree_fock
        .greens_functions
        .bound_state()
        .reported_residues();
    for (interacting, mean_field) in calculation.residues().iter().zip(hartree_fock.iter()) {
        assert_relative_eq!(interacting, mean_field, epsilon = 1e-8);
    }
    for (interacting, mean_field) in calculation
        .greens_functions
        .normal()
        .iter()
        .zip(calculation.hartree_fock.greens_functions.normal().iter())
    {
        assert_relative_eq!(interacting.re, mean_field.re, epsilon = 1e-10);
        assert_relative_eq!(interacting.im, mean_field.im, epsilon = 1e-10);
    }
}

#[test]
fn half_filling_is_particle_hole_symmetric() {
    let calculation = calculate(1., 0., 0.);
    assert_eq!(calculation.state.occupation, 0.5);
    let [lower, upper, anomalous] = calculation.residues();
    assert!((lower - upper).abs() < 1e-3);
    assert!(anomalous < 0.);
    assert!(!calculation
        .warnings
        .iter()
        .any(|w| matches!(w, ConsistencyWarning::NormalResidueMismatch { .. })));
    let w0 = calculation.bound_state_energy();
    assert!(w0 > 0. && w0 < 1.);
}

#[test]
fn converged_state_is_a_fixed_point_of_the_functionals() {
    let calculation = calculate(0.8, 0.3, 0.);
    assert_relative_eq!(
        calculation.densities.occupation,
        calculation.state.occupation,
        epsilon = 1e-5
    );
    assert_relative_eq!(
        calculation.densities.pairing,
        calculation.state.pairing,
        epsilon = 1e-5
    );
    let [mean_field, interacting] = calculation.integrated_density_of_states;
    assert_relative_eq!(mean_field, 1., epsilon = 1e-2);
    assert_relative_eq!(interacting, 1., epsilon = 1e-2);
}

#[test]
fn anomalous_residue_changes_sign_beyond_pi() {
    let zero_phase = calculate(0.5, 0., 0.);
    let beyond_pi = calculate(0.5, 0., 1.2);
    let [_, _, before] = zero_phase.residues();
    let [_, _, after] = beyond_pi.residues();
    assert!(before * after < 0.);

    let warnings = check_consistency(
        zero_phase.greens_functions.bound_state(),
        beyond_pi.greens_functions.bound_state(),
        true,
    );
    assert!(warnings
        .iter()
        .any(|w| matches!(w, ConsistencyWarning::AnomalousResidueSignFlip { .. })));
}

#[test]
fn closed_induced_gap_fails_in_the_mean_field_stage() {
    let parameters = ModelParameters::from_reduced(0.5, 1., 0.5, 1., 0., 1.).unwrap();
    let error = second_order_calculation(&parameters, &configuration()).unwrap_err();
    assert_eq!(error.stage(), "hartree-fock");
}

#[test]
fn invalid_settings_are_configuration_errors() {
    let parameters = ModelParameters::from_reduced(0.5, 1., 0.5, 1., 0., 0.).unwrap();
    let mut empty_bracket = configuration();
    empty_bracket.outer_loop.mu_min = 1.;
    let error = second_order_calculation(&parameters, &empty_bracket).unwrap_err();
    assert_eq!(error.stage(), "configuration");

    let mut oversize_grid = configuration();
    oversize_grid.grid.exponent = 40;
    let error = second_order_calculation(&parameters, &oversize_grid).unwrap_err();
    assert_eq!(error.stage(), "configuration");
}

#[test]
fn self_energy_is_reported_at_the_negative_bound_state() {
    let calculation = calculate(1., 0.3, 0.);
    let lower = calculation.greens_functions.bound_state().lower().energy();
    assert!(lower < 0.);
    let position = calculation.grid.nearest_position(lower).unwrap();
    let pair = calculation.self_energy.as_pair();
    let [normal, anomalous] = calculation.self_energy_at_bound_state;
    assert_eq!(normal, pair.normal[position.index()]);
    assert_eq!(anomalous, pair.anomalous[position.index()]);
}
