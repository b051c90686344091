//! # Calculations
//!
//! The full second order calculation at a single parameter point, delegated from `App`
use super::Configuration;
use crate::{
    error::SolverError,
    greens_functions::{DensityState, GreensFunctionBuilder, GreensFunctions},
    hamiltonian::ModelParameters,
    hartree_fock::{HartreeFockSolution, HartreeFockSolver},
    outer_loop::{Outer, OuterLoopBuilder},
    postprocessor::{
        check_consistency, ConsistencyWarning, JosephsonCurrent, PostProcess,
        PostProcessorBuilder,
    },
    self_energy::{SelfEnergy, SelfEnergyBuilder},
    spectral::EnergyGrid,
};
use num_complex::Complex64;

/// Everything computed at a single parameter point
#[derive(Clone, Debug)]
pub struct Calculation {
    /// The model parameters
    pub parameters: ModelParameters,
    /// The energy grid
    pub grid: EnergyGrid,
    /// The mean-field solution the perturbation expansion starts from
    pub hartree_fock: HartreeFockSolution,
    /// The second order self-energy and the bubbles it was built from
    pub self_energy: SelfEnergy,
    /// The self-consistent state of the density loop
    pub state: DensityState,
    /// The interacting Green's functions at `state`
    pub greens_functions: GreensFunctions,
    /// The density functionals re-evaluated at the converged state
    pub densities: DensityState,
    /// Integrated density of states of the mean-field and the interacting Green's functions
    pub integrated_density_of_states: [f64; 2],
    /// The normal and anomalous self-energy at the grid point nearest the lower pole `-w0`
    pub self_energy_at_bound_state: [Complex64; 2],
    /// The supercurrent
    pub josephson_current: JosephsonCurrent,
    /// Non-fatal inconsistencies of the solution
    pub warnings: Vec<ConsistencyWarning>,
}

impl Calculation {
    /// The bound state energy of the interacting solution
    pub fn bound_state_energy(&self) -> f64 {
        self.greens_functions.bound_state().energy()
    }

    /// The normal residues at `-w0` and `+w0` and the anomalous residue at `-w0`
    pub fn residues(&self) -> [f64; 3] {
        self.greens_functions.bound_state().reported_residues()
    }
}

/// Run the mean-field stage, build the second order self-energy and iterate the densities
pub fn second_order_calculation(
    parameters: &ModelParameters,
    configuration: &Configuration,
) -> Result<Calculation, SolverError> {
    let grid = configuration.grid.build()?;
    let tail = configuration.tail.settings()?;
    let convergence = configuration.outer_loop.convergence()?;
    tracing::info!(
        "Energy axis [{}, {}] with step {} and {} points",
        grid.energy_at(grid.first()),
        grid.maximum_energy(),
        grid.step(),
        grid.len()
    );

    let postprocessor = PostProcessorBuilder::new()
        .with_parameters(parameters)
        .with_grid(&grid)
        .build();

    let hartree_fock =
        HartreeFockSolver::new(parameters, &grid, configuration.hartree_fock.settings())?.solve()?;
    let hartree_fock_idos =
        postprocessor.integrated_density_of_states(&hartree_fock.greens_functions);
    tracing::info!(
        "Hartree-Fock solution: n = {}, mu = {}, wABS = {}, int(DoS) = {}",
        hartree_fock.state.occupation,
        hartree_fock.state.pairing,
        hartree_fock.bound_state_energy(),
        hartree_fock_idos
    );

    let self_energy = SelfEnergyBuilder::new()
        .with_parameters(parameters)
        .with_grid(&grid)
        .with_greens_functions(&hartree_fock.greens_functions)
        .with_tail(tail)
        .build();

    let mut outer_loop = OuterLoopBuilder::new()
        .with_convergence_settings(&convergence)
        .with_parameters(parameters)
        .with_grid(&grid)
        .with_self_energy(&self_energy)
        .with_initial_state(hartree_fock.state)
        .with_bound_state_hint(hartree_fock.bound_state_energy())
        .build();
    let state = outer_loop.run_loop()?;

    let greens_functions = GreensFunctionBuilder::new()
        .with_parameters(parameters)
        .with_grid(&grid)
        .with_self_energy(&self_energy)
        .with_state(state)
        .with_bound_state_hint(outer_loop.bound_state_hint())
        .build()?;

    let densities = DensityState::new(
        postprocessor.electron_density(&greens_functions),
        postprocessor.cooper_pair_density(&greens_functions),
    );
    let idos = postprocessor.integrated_density_of_states(&greens_functions);
    let josephson_current = postprocessor.josephson_current(&greens_functions);
    tracing::info!(
        "Second order solution: wABS = {}, n = {}, mu = {}, int(DoS) = {}",
        greens_functions.bound_state().energy(),
        densities.occupation,
        densities.pairing,
        idos
    );

    let self_energy_at_bound_state = grid
        .nearest_position(greens_functions.bound_state().lower().energy())
        .map(|position| {
            let pair = self_energy.as_pair();
            [pair.normal[position.index()], pair.anomalous[position.index()]]
        })
        .unwrap_or([Complex64::new(0., 0.); 2]);
    tracing::info!(
        "Self-energies at the bound state: Sigma_n = {}, Sigma_a = {}",
        self_energy_at_bound_state[0].re,
        self_energy_at_bound_state[1].re
    );
    tracing::info!(
        "Josephson current: band {}, gap {}, total {}",
        josephson_current.band,
        josephson_current.gap,
        josephson_current.total()
    );

    let warnings = check_consistency(
        hartree_fock.greens_functions.bound_state(),
        greens_functions.bound_state(),
        parameters.is_half_filled(),
    );

    Ok(Calculation {
        parameters: *parameters,
        grid,
        hartree_fock,
        self_energy,
        state,
        greens_functions,
        densities,
        integrated_density_of_states: [hartree_fock_idos, idos],
        self_energy_at_bound_state,
        josephson_current,
        warnings,
    })
}
