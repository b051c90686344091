//! # Postprocessing
//!
//! Quantities derived from a set of `GreensFunctions`: the density functionals closing the
//! self-consistency loops, the integrated density of states, the Josephson current and the
//! consistency checks performed on the converged solution.
mod consistency;
mod densities;
mod josephson;

pub use consistency::{check_consistency, ConsistencyWarning};
pub use josephson::JosephsonCurrent;

use crate::{
    greens_functions::{DensityState, GreensFunctions},
    hamiltonian::ModelParameters,
    spectral::EnergyGrid,
};

/// Type-state builder for the `PostProcessor`
pub struct PostProcessorBuilder<RefParameters, RefGrid> {
    parameters: RefParameters,
    grid: RefGrid,
}

impl PostProcessorBuilder<(), ()> {
    /// Initialise an empty builder
    pub fn new() -> Self {
        PostProcessorBuilder {
            parameters: (),
            grid: (),
        }
    }
}

impl<RefParameters, RefGrid> PostProcessorBuilder<RefParameters, RefGrid> {
    /// Attach the model parameters
    pub fn with_parameters<Parameters>(
        self,
        parameters: &Parameters,
    ) -> PostProcessorBuilder<&Parameters, RefGrid> {
        PostProcessorBuilder {
            parameters,
            grid: self.grid,
        }
    }

    /// Attach the energy grid
    pub fn with_grid<Grid>(self, grid: &Grid) -> PostProcessorBuilder<RefParameters, &Grid> {
        PostProcessorBuilder {
            parameters: self.parameters,
            grid,
        }
    }
}

impl<'a> PostProcessorBuilder<&'a ModelParameters, &'a EnergyGrid> {
    /// Build the postprocessor
    pub fn build(self) -> PostProcessor<'a> {
        PostProcessor {
            parameters: self.parameters,
            grid: self.grid,
        }
    }
}

/// Evaluates observables of `GreensFunctions` on a fixed grid
pub struct PostProcessor<'a> {
    parameters: &'a ModelParameters,
    grid: &'a EnergyGrid,
}

/// Observables which can be extracted from a set of Green's functions
pub trait PostProcess {
    /// The electron density `n` per spin
    fn electron_density(&self, greens_functions: &GreensFunctions) -> f64;
    /// The induced pairing `μ = -<d↓ d↑>`
    fn cooper_pair_density(&self, greens_functions: &GreensFunctions) -> f64;
    /// The densities of the state, the occupation is pinned at one half at the particle-hole symmetric point
    fn recompute_densities(&self, greens_functions: &GreensFunctions) -> DensityState;
    /// The total spectral weight of the normal function, unity up to discretisation error
    fn integrated_density_of_states(&self, greens_functions: &GreensFunctions) -> f64;
    /// The supercurrent through the dot
    fn josephson_current(&self, greens_functions: &GreensFunctions) -> JosephsonCurrent;
}

impl PostProcess for PostProcessor<'_> {
    fn electron_density(&self, greens_functions: &GreensFunctions) -> f64 {
        densities::electron_density(greens_functions, self.grid)
    }

    fn cooper_pair_density(&self, greens_functions: &GreensFunctions) -> f64 {
        densities::cooper_pair_density(greens_functions, self.grid)
    }

    fn recompute_densities(&self, greens_functions: &GreensFunctions) -> DensityState {
        let occupation = if self.parameters.is_half_filled() {
            0.5
        } else {
            self.electron_density(greens_functions)
        };
        DensityState::new(occupation, self.cooper_pair_density(greens_functions))
    }

    fn integrated_density_of_states(&self, greens_functions: &GreensFunctions) -> f64 {
        densities::integrated_density_of_states(greens_functions, self.grid)
    }

    fn josephson_current(&self, greens_functions: &GreensFunctions) -> JosephsonCurrent {
        josephson::josephson_current(self.parameters, greens_functions, self.grid)
    }
}
