//! # Hartree-Fock
//!
//! The static mean-field solution of the dot. The interaction enters only through the shifted level
//! `ed + U n` and the static pairing `U μ`, so the problem reduces to finding a self-consistent pair
//! `(n, μ)`. Each iteration locates the Andreev bound state of the current mean-field Green's
//! function, re-evaluates the densities and linearly mixes them into the state.
//!
//! The solution is the starting point of the second order calculation: its Green's functions build
//! the bubbles and its bound state energy seeds every later pole search.
use crate::{
    error::ConfigurationError,
    greens_functions::{DensityState, GreensFunctionBuilder, GreensFunctionError, GreensFunctions},
    hamiltonian::ModelParameters,
    postprocessor::{PostProcess, PostProcessorBuilder},
    spectral::EnergyGrid,
};
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of the mean-field stage
pub enum HartreeFockError {
    #[error(transparent)]
    /// The settings are invalid
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    /// A mean-field Green's function could not be built, usually because there is no bound state
    GreensFunction(#[from] GreensFunctionError),
    #[error("mean-field densities not converged after {iterations} iterations, last change {delta}")]
    /// The iteration cap was reached
    NotConverged {
        /// Number of completed iterations
        iterations: usize,
        /// The last change in the state
        delta: f64,
    },
}

/// Controls for the mean-field iteration
#[derive(Clone, Copy, Debug)]
pub struct HartreeFockSettings {
    /// Initial guess for the bound state energy
    pub initial_bound_state: f64,
    /// Convergence threshold on the change in `n` and `μ`
    pub tolerance: f64,
    /// Iteration cap
    pub maximum_iterations: usize,
    /// Fraction of the new densities mixed into the state each iteration
    pub mixing: f64,
}

impl Default for HartreeFockSettings {
    fn default() -> Self {
        Self {
            initial_bound_state: 0.5,
            tolerance: 1e-8,
            maximum_iterations: 500,
            mixing: 0.5,
        }
    }
}

/// A converged mean-field solution
#[derive(Clone, Debug)]
pub struct HartreeFockSolution {
    /// The self-consistent state
    pub state: DensityState,
    /// The Green's functions at `state`
    pub greens_functions: GreensFunctions,
    /// Number of iterations taken
    pub iterations: usize,
}

impl HartreeFockSolution {
    /// The bound state energy `w0` of the mean-field solution
    pub fn bound_state_energy(&self) -> f64 {
        self.greens_functions.bound_state().energy()
    }
}

/// Iterates the mean-field equations to self-consistency
pub struct HartreeFockSolver<'a> {
    parameters: &'a ModelParameters,
    grid: &'a EnergyGrid,
    settings: HartreeFockSettings,
}

impl<'a> HartreeFockSolver<'a> {
    /// Create a solver, failing if the settings cannot describe a bound state
    pub fn new(
        parameters: &'a ModelParameters,
        grid: &'a EnergyGrid,
        settings: HartreeFockSettings,
    ) -> Result<Self, ConfigurationError> {
        let gap = parameters.gap();
        if !(settings.initial_bound_state > 0. && settings.initial_bound_state < gap) {
            return Err(ConfigurationError::InitialBoundState(
                settings.initial_bound_state,
                gap,
            ));
        }
        Ok(Self {
            parameters,
            grid,
            settings,
        })
    }

    fn greens_functions(
        &self,
        state: DensityState,
        hint: f64,
    ) -> Result<GreensFunctions, GreensFunctionError> {
        GreensFunctionBuilder::new()
            .with_parameters(self.parameters)
            .with_grid(self.grid)
            .with_state(state)
            .with_bound_state_hint(hint)
            .build()
    }

    /// Solve for the self-consistent `(n, μ)`
    #[tracing::instrument(name = "Hartree-Fock", skip_all)]
    pub fn solve(&self) -> Result<HartreeFockSolution, HartreeFockError> {
        let postprocessor = PostProcessorBuilder::new()
            .with_parameters(self.parameters)
            .with_grid(self.grid)
            .build();
        let mixing = self.settings.mixing.clamp(f64::EPSILON, 1.);

        // Start at half filling with the pairing of the uncorrelated state
        let mut hint = self.settings.initial_bound_state;
        let initial = self.greens_functions(DensityState::new(0.5, 0.), hint)?;
        hint = initial.bound_state().energy();
        let mut state = DensityState::new(0.5, postprocessor.cooper_pair_density(&initial));
        tracing::debug!("Initial mean-field state {:?}, w0 = {}", state, hint);

        let mut delta = f64::INFINITY;
        for iteration in 1..=self.settings.maximum_iterations {
            let greens_functions = self.greens_functions(state, hint)?;
            hint = greens_functions.bound_state().energy();
            let update = postprocessor.recompute_densities(&greens_functions);
            delta = state.distance(&update);
            tracing::debug!(
                "Iteration {}: n = {}, mu = {}, w0 = {}, change {}",
                iteration,
                update.occupation,
                update.pairing,
                hint,
                delta
            );

            if delta < self.settings.tolerance {
                let greens_functions = self.greens_functions(update, hint)?;
                tracing::info!(
                    "Mean-field solution converged in {} iterations: n = {}, mu = {}, w0 = {}",
                    iteration,
                    update.occupation,
                    update.pairing,
                    greens_functions.bound_state().energy()
                );
                return Ok(HartreeFockSolution {
                    state: update,
                    greens_functions,
                    iterations: iteration,
                });
            }

            state = DensityState::new(
                state.occupation + mixing * (update.occupation - state.occupation),
                state.pairing + mixing * (update.pairing - state.pairing),
            );
        }

        Err(HartreeFockError::NotConverged {
            iterations: self.settings.maximum_iterations,
            delta,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{HartreeFockError, HartreeFockSettings, HartreeFockSolver};
    use crate::{
        greens_functions::GreensFunctionError,
        hamiltonian::ModelParameters,
        postprocessor::{PostProcess, PostProcessorBuilder},
        spectral::{EnergyGrid, EnergyGridBuilder},
    };
    use approx::assert_relative_eq;

    fn grid() -> EnergyGrid {
        EnergyGridBuilder::new()
            .with_step(0.01)
            .with_exponent(12)
            .build()
            .unwrap()
    }

    #[test]
    fn half_filling_pins_the_occupation() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(1., 1., 0.5, 1., 0., 0.3).unwrap();
        let solution = HartreeFockSolver::new(&parameters, &grid, HartreeFockSettings::default())
            .unwrap()
            .solve()
            .unwrap();
        assert_eq!(solution.state.occupation, 0.5);
        assert!(solution.state.pairing > 0.);
        let w0 = solution.bound_state_energy();
        assert!(w0 > 0. && w0 < 1.);
    }

    #[test]
    fn converged_state_is_a_fixed_point() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(0.8, 1., 0.5, 1., 0.3, 0.).unwrap();
        let settings = HartreeFockSettings {
            tolerance: 1e-10,
            ..HartreeFockSettings::default()
        };
        let solution = HartreeFockSolver::new(&parameters, &grid, settings)
            .unwrap()
            .solve()
            .unwrap();
        let postprocessor = PostProcessorBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build();
        let update = postprocessor.recompute_densities(&solution.greens_functions);
        assert_relative_eq!(update.occupation, solution.state.occupation, epsilon = 1e-8);
        assert_relative_eq!(update.pairing, solution.state.pairing, epsilon = 1e-8);
    }

    #[test]
    fn initial_guess_outside_the_gap_is_rejected() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(1., 1., 0.5, 1., 0., 0.).unwrap();
        let settings = HartreeFockSettings {
            initial_bound_state: 1.5,
            ..HartreeFockSettings::default()
        };
        assert!(HartreeFockSolver::new(&parameters, &grid, settings).is_err());
    }

    #[test]
    fn closed_induced_gap_is_a_convergence_failure() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(0.5, 1., 0.5, 1., 0., 1.).unwrap();
        let result = HartreeFockSolver::new(&parameters, &grid, HartreeFockSettings::default())
            .unwrap()
            .solve();
        assert!(matches!(
            result,
            Err(HartreeFockError::GreensFunction(
                GreensFunctionError::NoBoundState(_, _)
            ))
        ));
    }

    #[test]
    fn iteration_cap_is_reported() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(1., 1., 0.5, 1., 0.4, 0.).unwrap();
        let settings = HartreeFockSettings {
            maximum_iterations: 1,
            tolerance: 1e-14,
            mixing: 0.1,
            ..HartreeFockSettings::default()
        };
        let result = HartreeFockSolver::new(&parameters, &grid, settings)
            .unwrap()
            .solve();
        assert!(matches!(
            result,
            Err(HartreeFockError::NotConverged { iterations: 1, .. })
        ));
    }
}
