//! # Self-energy
//!
//! The dynamical part of the second order self-energy. It is built once from the converged
//! Hartree-Fock Green's functions and held fixed while the density loop adjusts the static state.
//!
//! ```ignore
//! let self_energy = SelfEnergyBuilder::new()
//!     .with_parameters(&parameters)
//!     .with_grid(&grid)
//!     .with_greens_functions(&hartree_fock.greens_functions)
//!     .with_tail(tail)
//!     .build();
//! ```
mod bubbles;
mod second_order;

pub use bubbles::Bubbles;

use crate::{
    greens_functions::{Channel, DynamicSelfEnergy, GreensFunctions},
    hamiltonian::ModelParameters,
    spectral::{fit_tail, EnergyGrid, GridPosition, KramersKronig, SpectralPair, TailSettings},
};
use num_complex::Complex64;
use second_order::schwinger_dyson;

/// Type-state builder for the `SelfEnergy`
pub struct SelfEnergyBuilder<RefParameters, RefGrid, RefGreensFunctions> {
    parameters: RefParameters,
    grid: RefGrid,
    greens_functions: RefGreensFunctions,
    tail: Option<TailSettings>,
}

impl SelfEnergyBuilder<(), (), ()> {
    /// Initialise an empty builder, tails are left unfitted unless settings are attached
    pub fn new() -> Self {
        Self {
            parameters: (),
            grid: (),
            greens_functions: (),
            tail: None,
        }
    }
}

impl<RefParameters, RefGrid, RefGreensFunctions>
    SelfEnergyBuilder<RefParameters, RefGrid, RefGreensFunctions>
{
    /// Attach the model parameters
    pub fn with_parameters<Parameters>(
        self,
        parameters: &Parameters,
    ) -> SelfEnergyBuilder<&Parameters, RefGrid, RefGreensFunctions> {
        SelfEnergyBuilder {
            parameters,
            grid: self.grid,
            greens_functions: self.greens_functions,
            tail: self.tail,
        }
    }

    /// Attach the energy grid
    pub fn with_grid<Grid>(
        self,
        grid: &Grid,
    ) -> SelfEnergyBuilder<RefParameters, &Grid, RefGreensFunctions> {
        SelfEnergyBuilder {
            parameters: self.parameters,
            grid,
            greens_functions: self.greens_functions,
            tail: self.tail,
        }
    }

    /// Attach the mean-field Green's functions the bubbles are built from
    pub fn with_greens_functions<Functions>(
        self,
        greens_functions: &Functions,
    ) -> SelfEnergyBuilder<RefParameters, RefGrid, &Functions> {
        SelfEnergyBuilder {
            parameters: self.parameters,
            grid: self.grid,
            greens_functions,
            tail: self.tail,
        }
    }

    /// Fit the asymptotic tails of the convolved functions, or leave them if `None`
    pub fn with_tail(self, tail: Option<TailSettings>) -> Self {
        Self { tail, ..self }
    }
}

impl<'a> SelfEnergyBuilder<&'a ModelParameters, &'a EnergyGrid, &'a GreensFunctions> {
    /// Compute the bubbles and the second order self-energy
    #[tracing::instrument(name = "Second order self-energy", skip_all)]
    pub fn build(self) -> SelfEnergy {
        let transform = KramersKronig::new(self.grid);
        let bubbles = Bubbles::new(
            self.greens_functions,
            self.grid,
            &transform,
            self.tail.as_ref(),
        );

        let interaction = self.parameters.interaction();
        if interaction == 0. {
            tracing::info!("No interaction, the self-energy vanishes");
            return SelfEnergy {
                bubbles,
                values: SpectralPair::zeros(self.grid.len()),
            };
        }

        let kernel = bubbles.kernel(interaction);
        let mut normal = schwinger_dyson(
            self.greens_functions,
            &kernel,
            Channel::Normal,
            self.grid,
            &transform,
        );
        let mut anomalous = schwinger_dyson(
            self.greens_functions,
            &kernel,
            Channel::Anomalous,
            self.grid,
            &transform,
        );
        if let Some(tail) = self.tail.as_ref() {
            fit_tail(self.grid, &mut normal, &tail.window, tail.normal);
            fit_tail(self.grid, &mut anomalous, &tail.window, tail.anomalous);
        }

        let centre = self.grid.centre().index();
        tracing::info!(
            "Self-energy at the Fermi level: Sigma_n(0) = {}, Sigma_a(0) = {}",
            normal[centre],
            anomalous[centre]
        );
        SelfEnergy {
            bubbles,
            values: SpectralPair { normal, anomalous },
        }
    }
}

/// The second order self-energy sampled on the grid, together with the bubbles it was built from
#[derive(Clone, Debug)]
pub struct SelfEnergy {
    bubbles: Bubbles,
    values: SpectralPair,
}

impl SelfEnergy {
    /// The normal and anomalous self-energy
    pub fn as_pair(&self) -> &SpectralPair {
        &self.values
    }

    /// The bubbles the self-energy was built from
    pub fn bubbles(&self) -> &Bubbles {
        &self.bubbles
    }

    /// Whether the self-energy vanishes at every grid point
    pub fn is_identically_zero(&self) -> bool {
        self.values.is_identically_zero()
    }
}

impl DynamicSelfEnergy for SelfEnergy {
    fn on_grid(&self, position: GridPosition) -> (Complex64, Complex64) {
        (
            self.values.normal[position.index()],
            self.values.anomalous[position.index()],
        )
    }

    fn interpolated(&self, grid: &EnergyGrid, omega: f64) -> (Complex64, Complex64) {
        (
            grid.interpolate(&self.values.normal, omega),
            grid.interpolate(&self.values.anomalous, omega),
        )
    }
}
