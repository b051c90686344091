use super::{OuterLoop, OuterLoopError};
use crate::{
    greens_functions::{
        DensityState, DynamicSelfEnergy, GreensFunctionBuilder, GreensFunctionError,
        GreensFunctions,
    },
    postprocessor::{PostProcess, PostProcessorBuilder},
};

/// The self-consistent density iteration
pub trait Outer {
    /// Check whether the change in the state since `previous_state` is within tolerance, replacing
    /// `previous_state` with the current state
    fn is_loop_converged(&self, previous_state: &mut DensityState) -> bool;
    /// Carry out a single iteration of the self-consistent loop
    fn single_iteration(&mut self) -> Result<(), OuterLoopError>;
    /// Run the loop to convergence, returning the converged state
    fn run_loop(&mut self) -> Result<DensityState, OuterLoopError>;
}

impl<SelfEnergy: DynamicSelfEnergy> Outer for OuterLoop<'_, SelfEnergy> {
    fn is_loop_converged(&self, previous_state: &mut DensityState) -> bool {
        let state = self.tracker.state;
        let tolerance = self.convergence.tolerance();
        let result = (state.occupation - previous_state.occupation).abs() < tolerance
            && (state.pairing - previous_state.pairing).abs() < tolerance;
        tracing::debug!(
            "Density change {} after {} iterations",
            state.distance(previous_state),
            self.tracker.iterations
        );
        let _ = std::mem::replace(previous_state, state);
        result
    }

    fn single_iteration(&mut self) -> Result<(), OuterLoopError> {
        let strategy = self.convergence.method().strategy(
            self.convergence.root_tolerance(),
            self.convergence.maximum_root_iterations(),
        );
        let current = self.tracker.state;

        let occupation = if self.parameters.is_half_filled() {
            0.5
        } else {
            let map = |x: f64| -> anyhow::Result<f64> {
                Ok(self.electron_density_at(DensityState::new(x, current.pairing))?)
            };
            strategy
                .solve_fixed_point(&map, [0., 1.], current.occupation)
                .map_err(|e| OuterLoopError::from_root_finding("electron density", e))?
        };

        let map = |x: f64| -> anyhow::Result<f64> {
            Ok(self.cooper_pair_density_at(DensityState::new(occupation, x))?)
        };
        let pairing = strategy
            .solve_fixed_point(&map, self.convergence.pairing_bracket(), current.pairing)
            .map_err(|e| OuterLoopError::from_root_finding("Cooper pair density", e))?;

        self.accept(DensityState::new(occupation, pairing))?;
        tracing::info!(
            "Density iteration {}: n = {}, mu = {}, w0 = {}",
            self.tracker.iterations + 1,
            occupation,
            pairing,
            self.tracker.hint
        );
        Ok(())
    }

    fn run_loop(&mut self) -> Result<DensityState, OuterLoopError> {
        let mut previous_state = self.tracker.state;
        self.initialise()?;
        let mut iteration = 0;
        while !self.is_loop_converged(&mut previous_state) {
            self.single_iteration()?;
            iteration += 1;
            self.tracker.iterations = iteration;
            if iteration >= self.convergence.maximum_iterations() {
                return Err(OuterLoopError::TooManyIterations {
                    iterations: iteration,
                    state: self.tracker.state,
                });
            }
        }
        tracing::info!(
            "Density loop converged after {} iterations: n = {}, mu = {}",
            iteration,
            self.tracker.state.occupation,
            self.tracker.state.pairing
        );
        Ok(self.tracker.state)
    }
}

impl<SelfEnergy: DynamicSelfEnergy> OuterLoop<'_, SelfEnergy> {
    fn greens_functions_at(
        &self,
        state: DensityState,
    ) -> Result<GreensFunctions, GreensFunctionError> {
        GreensFunctionBuilder::new()
            .with_parameters(self.parameters)
            .with_grid(self.grid)
            .with_self_energy(self.self_energy)
            .with_state(state)
            .with_bound_state_hint(self.tracker.hint)
            .build()
    }

    fn electron_density_at(&self, state: DensityState) -> Result<f64, GreensFunctionError> {
        let greens_functions = self.greens_functions_at(state)?;
        Ok(PostProcessorBuilder::new()
            .with_parameters(self.parameters)
            .with_grid(self.grid)
            .build()
            .electron_density(&greens_functions))
    }

    fn cooper_pair_density_at(&self, state: DensityState) -> Result<f64, GreensFunctionError> {
        let greens_functions = self.greens_functions_at(state)?;
        Ok(PostProcessorBuilder::new()
            .with_parameters(self.parameters)
            .with_grid(self.grid)
            .build()
            .cooper_pair_density(&greens_functions))
    }

    /// One evaluation of each density functional at the initial state
    fn initialise(&mut self) -> Result<(), OuterLoopError> {
        let initial = self.tracker.state;
        let occupation = if self.parameters.is_half_filled() {
            0.5
        } else {
            self.electron_density_at(initial)?
        };
        let pairing = self.cooper_pair_density_at(DensityState::new(occupation, initial.pairing))?;
        self.accept(DensityState::new(occupation, pairing))?;
        tracing::debug!(
            "Initial interacting state: n = {}, mu = {}, w0 = {}",
            occupation,
            pairing,
            self.tracker.hint
        );
        Ok(())
    }

    /// Store a new state and move the bound state hint to its bound state
    fn accept(&mut self, state: DensityState) -> Result<(), OuterLoopError> {
        let greens_functions = self.greens_functions_at(state)?;
        self.tracker.hint = greens_functions.bound_state().energy();
        self.tracker.state = state;
        Ok(())
    }
}
