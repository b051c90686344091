//! # Density loop
//!
//! With the dynamical self-energy held fixed, the static state `(n, μ)` entering the Hartree-Fock
//! level and the static pairing is made consistent with the densities of the interacting Green's
//! function. Each iteration solves the scalar fixed point problems
//!
//! ```text
//! x = n[x, μ]    on [0, 1]
//! x = μ[n, x]    on [mu_min, mu_max]
//! ```
//!
//! in turn, the occupation being pinned to one half at the particle-hole symmetric point.
mod convergence;
mod methods;

pub use convergence::Convergence;
pub use methods::Outer;

use crate::{
    greens_functions::{DensityState, DynamicSelfEnergy, GreensFunctionError},
    hamiltonian::ModelParameters,
    spectral::EnergyGrid,
    utilities::root_finding::RootFindingError,
};
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of the density loop
pub enum OuterLoopError {
    #[error(transparent)]
    /// The interacting Green's function has no bound state at a trial state
    GreensFunction(#[from] GreensFunctionError),
    #[error("failed to solve for the {quantity}")]
    /// The scalar root finder failed
    RootFinding {
        /// The density being solved for
        quantity: &'static str,
        /// The failure
        #[source]
        source: RootFindingError,
    },
    #[error("reached the maximum of {iterations} density iterations, last state {state:?}")]
    /// The iteration cap was reached
    TooManyIterations {
        /// Number of completed iterations
        iterations: usize,
        /// The last state reached
        state: DensityState,
    },
}

impl OuterLoopError {
    /// Attach the quantity to a root finding failure, recovering Green's function failures raised
    /// while evaluating the density functionals
    pub(crate) fn from_root_finding(quantity: &'static str, error: RootFindingError) -> Self {
        match error {
            RootFindingError::Evaluation(inner) => match inner.downcast::<GreensFunctionError>() {
                Ok(greens_function_error) => OuterLoopError::GreensFunction(greens_function_error),
                Err(inner) => OuterLoopError::RootFinding {
                    quantity,
                    source: RootFindingError::Evaluation(inner),
                },
            },
            source => OuterLoopError::RootFinding { quantity, source },
        }
    }
}

/// Builder for the `OuterLoop`
pub struct OuterLoopBuilder<RefConvergence, RefParameters, RefGrid, RefSelfEnergy> {
    convergence: RefConvergence,
    parameters: RefParameters,
    grid: RefGrid,
    self_energy: RefSelfEnergy,
    initial_state: DensityState,
    hint: Option<f64>,
}

impl OuterLoopBuilder<(), (), (), ()> {
    /// Initialise an empty builder, starting from half filling without pairing
    pub fn new() -> Self {
        Self {
            convergence: (),
            parameters: (),
            grid: (),
            self_energy: (),
            initial_state: DensityState::new(0.5, 0.),
            hint: None,
        }
    }
}

impl<RefConvergence, RefParameters, RefGrid, RefSelfEnergy>
    OuterLoopBuilder<RefConvergence, RefParameters, RefGrid, RefSelfEnergy>
{
    /// Attach the convergence settings
    pub fn with_convergence_settings<Settings>(
        self,
        convergence: &Settings,
    ) -> OuterLoopBuilder<&Settings, RefParameters, RefGrid, RefSelfEnergy> {
        OuterLoopBuilder {
            convergence,
            parameters: self.parameters,
            grid: self.grid,
            self_energy: self.self_energy,
            initial_state: self.initial_state,
            hint: self.hint,
        }
    }

    /// Attach the model parameters
    pub fn with_parameters<Parameters>(
        self,
        parameters: &Parameters,
    ) -> OuterLoopBuilder<RefConvergence, &Parameters, RefGrid, RefSelfEnergy> {
        OuterLoopBuilder {
            convergence: self.convergence,
            parameters,
            grid: self.grid,
            self_energy: self.self_energy,
            initial_state: self.initial_state,
            hint: self.hint,
        }
    }

    /// Attach the energy grid
    pub fn with_grid<Grid>(
        self,
        grid: &Grid,
    ) -> OuterLoopBuilder<RefConvergence, RefParameters, &Grid, RefSelfEnergy> {
        OuterLoopBuilder {
            convergence: self.convergence,
            parameters: self.parameters,
            grid,
            self_energy: self.self_energy,
            initial_state: self.initial_state,
            hint: self.hint,
        }
    }

    /// Attach the fixed dynamical self-energy
    pub fn with_self_energy<SelfEnergy>(
        self,
        self_energy: &SelfEnergy,
    ) -> OuterLoopBuilder<RefConvergence, RefParameters, RefGrid, &SelfEnergy> {
        OuterLoopBuilder {
            convergence: self.convergence,
            parameters: self.parameters,
            grid: self.grid,
            self_energy,
            initial_state: self.initial_state,
            hint: self.hint,
        }
    }

    /// The state the loop starts from, usually the Hartree-Fock solution
    pub fn with_initial_state(self, initial_state: DensityState) -> Self {
        Self {
            initial_state,
            ..self
        }
    }

    /// The energy near which the bound state is first sought
    pub fn with_bound_state_hint(self, hint: f64) -> Self {
        Self {
            hint: Some(hint),
            ..self
        }
    }
}

impl<'a, SelfEnergy: DynamicSelfEnergy>
    OuterLoopBuilder<&'a Convergence, &'a ModelParameters, &'a EnergyGrid, &'a SelfEnergy>
{
    /// Build the loop
    pub fn build(self) -> OuterLoop<'a, SelfEnergy> {
        OuterLoop {
            convergence: self.convergence,
            parameters: self.parameters,
            grid: self.grid,
            self_energy: self.self_energy,
            tracker: LoopTracker {
                state: self.initial_state,
                hint: self
                    .hint
                    .unwrap_or_else(|| 0.5 * self.parameters.gap()),
                iterations: 0,
            },
        }
    }
}

/// Holds the information to carry out the density iteration
pub struct OuterLoop<'a, SelfEnergy> {
    convergence: &'a Convergence,
    parameters: &'a ModelParameters,
    grid: &'a EnergyGrid,
    self_energy: &'a SelfEnergy,
    tracker: LoopTracker,
}

/// The most recently accepted state of the loop
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopTracker {
    state: DensityState,
    hint: f64,
    iterations: usize,
}

impl<SelfEnergy> OuterLoop<'_, SelfEnergy> {
    /// The current state
    pub fn state(&self) -> DensityState {
        self.tracker.state
    }

    /// The bound state energy at the current state
    pub fn bound_state_hint(&self) -> f64 {
        self.tracker.hint
    }

    /// The number of completed iterations
    pub fn iterations(&self) -> usize {
        self.tracker.iterations
    }
}
