//! # Green's functions
//!
//! The retarded Nambu Green's function of the dot is the inverse of
//!
//! ```text
//!        | a(ω) - e - Σn(ω)        -Δeff(ω)             |
//! G^-1 = |                                              |
//!        | -Δeff(ω)                a(ω) + e + Σn(-ω)*   |
//! ```
//!
//! where `a(ω) = ω (1 + s(ω))` carries the lead hybridisation, `e = ed + U n` is the Hartree-Fock level
//! and `Δeff(ω) = Δ_Φ(ω) - U μ + Σa(ω)` the effective pairing. With the determinant `D` of the inverse
//! the three independent components are
//!
//! - the normal function `Gn = (a + e + Σn(-ω)*) / D`
//! - the hole function `Gh = (a - e - Σn(ω)) / D`
//! - the anomalous function `Ga = Δeff / D`
//!
//! A `GreensFunctions` is built from the model parameters, the grid, the static state `(n, μ)` and an
//! optional dynamical self-energy. Without a self-energy the result is the Hartree-Fock Green's function.
//!
//! ```ignore
//! let greens_functions = GreensFunctionBuilder::new()
//!     .with_parameters(&parameters)
//!     .with_grid(&grid)
//!     .with_state(state)
//!     .with_self_energy(&self_energy)
//!     .build()?;
//! ```
mod andreev;

pub use andreev::{residue_at, AndreevBoundState, Pole, PoleResidues};

use crate::{
    constants::GAP_EDGE_OFFSET,
    hamiltonian::ModelParameters,
    spectral::{EnergyGrid, GridPosition, SpectralPair},
    utilities::root_finding::RootFindingError,
};
use andreev::locate_pole;
use miette::Diagnostic;
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures when constructing the Green's functions
pub enum GreensFunctionError {
    #[error("the determinant does not change sign in [{0}, {1}], there is no Andreev bound state")]
    /// No in-gap pole exists for this state
    NoBoundState(f64, f64),
    #[error("the pole at {0} does not lie on the energy grid")]
    /// The grid is too narrow to hold the gap
    PoleOffGrid(f64),
    #[error(transparent)]
    /// Refining the pole failed
    RootFinding(#[from] RootFindingError),
}

/// The static state of the dot: electron density `n` and induced pairing `μ = -<d↓ d↑>`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityState {
    /// The occupation of one spin species
    pub occupation: f64,
    /// The induced pairing
    pub pairing: f64,
}

impl DensityState {
    /// Create a state from the occupation and pairing
    pub fn new(occupation: f64, pairing: f64) -> Self {
        Self {
            occupation,
            pairing,
        }
    }

    /// The largest of the absolute changes in occupation and pairing
    pub fn distance(&self, other: &DensityState) -> f64 {
        (self.occupation - other.occupation)
            .abs()
            .max((self.pairing - other.pairing).abs())
    }
}

/// A dynamical self-energy entering the Green's function
pub trait DynamicSelfEnergy {
    /// The normal and anomalous self-energy at a grid position
    fn on_grid(&self, position: GridPosition) -> (Complex64, Complex64);
    /// The normal and anomalous self-energy linearly interpolated to `omega`
    fn interpolated(&self, grid: &EnergyGrid, omega: f64) -> (Complex64, Complex64);
}

/// The Hartree-Fock level has no dynamical self-energy
impl DynamicSelfEnergy for () {
    fn on_grid(&self, _position: GridPosition) -> (Complex64, Complex64) {
        (Complex64::new(0., 0.), Complex64::new(0., 0.))
    }

    fn interpolated(&self, _grid: &EnergyGrid, _omega: f64) -> (Complex64, Complex64) {
        (Complex64::new(0., 0.), Complex64::new(0., 0.))
    }
}

/// The channel of the Nambu Green's function
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// The particle channel
    Normal,
    /// The anomalous channel
    Anomalous,
}

/// The elements of the inverse Nambu propagator at a single frequency
#[derive(Clone, Copy, Debug)]
pub(crate) struct NambuElements {
    particle_inverse: Complex64,
    hole_inverse: Complex64,
    pairing: Complex64,
    determinant: Complex64,
}

impl NambuElements {
    pub(crate) fn normal(&self) -> Complex64 {
        self.hole_inverse / self.determinant
    }

    pub(crate) fn anomalous(&self) -> Complex64 {
        self.pairing / self.determinant
    }
}

/// Evaluates the inverse Nambu propagator for a fixed static state and self-energy
pub(crate) struct NambuKernel<'a, SelfEnergy> {
    parameters: &'a ModelParameters,
    grid: &'a EnergyGrid,
    self_energy: &'a SelfEnergy,
    level: f64,
    static_pairing: f64,
}

impl<'a, SelfEnergy: DynamicSelfEnergy> NambuKernel<'a, SelfEnergy> {
    pub(crate) fn new(
        parameters: &'a ModelParameters,
        grid: &'a EnergyGrid,
        self_energy: &'a SelfEnergy,
        state: DensityState,
    ) -> Self {
        Self {
            parameters,
            grid,
            self_energy,
            level: parameters.hartree_fock_level(state.occupation),
            static_pairing: parameters.interaction() * state.pairing,
        }
    }

    fn assemble(
        &self,
        omega: f64,
        normal: Complex64,
        normal_mirrored: Complex64,
        anomalous: Complex64,
    ) -> Option<NambuElements> {
        let hybridisation = self.parameters.hybridisation(omega)?;
        let particle_inverse = hybridisation.renormalised_frequency - self.level - normal;
        let hole_inverse =
            hybridisation.renormalised_frequency + self.level + normal_mirrored.conj();
        let pairing = hybridisation.pairing - self.static_pairing + anomalous;
        Some(NambuElements {
            particle_inverse,
            hole_inverse,
            pairing,
            determinant: particle_inverse * hole_inverse - pairing * pairing,
        })
    }

    /// The elements at an arbitrary frequency, `None` on the gap edge
    pub(crate) fn at(&self, omega: f64) -> Option<NambuElements> {
        let (normal, anomalous) = self.self_energy.interpolated(self.grid, omega);
        let (normal_mirrored, _) = self.self_energy.interpolated(self.grid, -omega);
        self.assemble(omega, normal, normal_mirrored, anomalous)
    }

    /// The elements at a grid point, `None` on the gap edge
    pub(crate) fn at_position(&self, position: GridPosition) -> Option<NambuElements> {
        let (normal, anomalous) = self.self_energy.on_grid(position);
        let (normal_mirrored, _) = self.self_energy.on_grid(self.grid.mirror(position));
        self.assemble(
            self.grid.energy_at(position),
            normal,
            normal_mirrored,
            anomalous,
        )
    }

    fn real_determinant(&self, omega: f64) -> f64 {
        self.at(omega)
            .map(|elements| elements.determinant.re)
            .unwrap_or(f64::NAN)
    }

    /// Locate the pole nearest `hint` in the interval and compute its residues
    fn pole(&self, interval: [f64; 2], hint: f64) -> Result<Pole, GreensFunctionError> {
        let gap = self.parameters.gap();
        let energy = locate_pole(
            &|omega| self.real_determinant(omega),
            interval,
            hint,
            self.grid.step(),
        )?;
        let step = (1e-4 * gap)
            .min(0.25 * (gap - energy.abs()))
            .min(0.25 * energy.abs());
        let determinant = |omega: f64| {
            self.at(omega)
                .map(|elements| elements.determinant)
                .unwrap_or_else(|| Complex64::new(f64::NAN, 0.))
        };
        let numerator = |omega: f64, channel: fn(&NambuElements) -> Complex64| {
            self.at(omega)
                .map(|elements| channel(&elements))
                .unwrap_or_else(|| Complex64::new(f64::NAN, 0.))
        };
        let residues = PoleResidues {
            normal: residue_at(
                &|omega| numerator(omega, |e| e.hole_inverse),
                &determinant,
                energy,
                step,
            )
            .re,
            hole: residue_at(
                &|omega| numerator(omega, |e| e.particle_inverse),
                &determinant,
                energy,
                step,
            )
            .re,
            anomalous: residue_at(
                &|omega| numerator(omega, |e| e.pairing),
                &determinant,
                energy,
                step,
            )
            .re,
        };
        Pole::new(energy, self.grid, residues)
    }

    /// Locate both poles of the Andreev bound state
    pub(crate) fn bound_state(&self, hint: f64) -> Result<AndreevBoundState, GreensFunctionError> {
        let gap = self.parameters.gap();
        let inner = GAP_EDGE_OFFSET * gap;
        let outer = (1. - GAP_EDGE_OFFSET) * gap;
        let hint = hint.abs();
        let upper = self.pole([inner, outer], hint)?;
        let lower = self.pole([-outer, -inner], -upper.energy())?;
        Ok(AndreevBoundState::new(lower, upper))
    }
}

/// Type-state builder for `GreensFunctions`
pub struct GreensFunctionBuilder<RefParameters, RefGrid, RefSelfEnergy> {
    parameters: RefParameters,
    grid: RefGrid,
    self_energy: RefSelfEnergy,
    state: DensityState,
    hint: Option<f64>,
}

impl GreensFunctionBuilder<(), (), ()> {
    /// Initialise an empty builder, the static state defaults to half filling without pairing
    pub fn new() -> Self {
        Self {
            parameters: (),
            grid: (),
            self_energy: (),
            state: DensityState::new(0.5, 0.),
            hint: None,
        }
    }
}

impl<RefParameters, RefGrid, RefSelfEnergy>
    GreensFunctionBuilder<RefParameters, RefGrid, RefSelfEnergy>
{
    /// Attach the model parameters
    pub fn with_parameters<Parameters>(
        self,
        parameters: &Parameters,
    ) -> GreensFunctionBuilder<&Parameters, RefGrid, RefSelfEnergy> {
        GreensFunctionBuilder {
            parameters,
            grid: self.grid,
            self_energy: self.self_energy,
            state: self.state,
            hint: self.hint,
        }
    }

    /// Attach the energy grid
    pub fn with_grid<Grid>(
        self,
        grid: &Grid,
    ) -> GreensFunctionBuilder<RefParameters, &Grid, RefSelfEnergy> {
        GreensFunctionBuilder {
            parameters: self.parameters,
            grid,
            self_energy: self.self_energy,
            state: self.state,
            hint: self.hint,
        }
    }

    /// Attach a dynamical self-energy
    pub fn with_self_energy<SelfEnergy>(
        self,
        self_energy: &SelfEnergy,
    ) -> GreensFunctionBuilder<RefParameters, RefGrid, &SelfEnergy> {
        GreensFunctionBuilder {
            parameters: self.parameters,
            grid: self.grid,
            self_energy,
            state: self.state,
            hint: self.hint,
        }
    }

    /// Set the static state `(n, μ)`
    pub fn with_state(self, state: DensityState) -> Self {
        Self { state, ..self }
    }

    /// Set the energy near which the positive energy bound state is sought
    pub fn with_bound_state_hint(self, hint: f64) -> Self {
        Self {
            hint: Some(hint),
            ..self
        }
    }
}

impl<'a> GreensFunctionBuilder<&'a ModelParameters, &'a EnergyGrid, ()> {
    /// Build the Hartree-Fock Green's functions
    pub fn build(self) -> Result<GreensFunctions, GreensFunctionError> {
        self.with_self_energy(&()).build()
    }
}

impl<'a, SelfEnergy: DynamicSelfEnergy>
    GreensFunctionBuilder<&'a ModelParameters, &'a EnergyGrid, &'a SelfEnergy>
{
    /// Build the Green's functions dressed with the attached self-energy
    pub fn build(self) -> Result<GreensFunctions, GreensFunctionError> {
        let kernel = NambuKernel::new(self.parameters, self.grid, self.self_energy, self.state);
        let bound_state = kernel.bound_state(self.hint.unwrap_or(0.5 * self.parameters.gap()))?;

        let num_points = self.grid.len();
        let mut normal = Array1::zeros(num_points);
        let mut anomalous = Array1::zeros(num_points);
        for position in self.grid.positions() {
            let idx = position.index();
            if let Some(elements) = kernel.at_position(position) {
                normal[idx] = elements.normal();
                anomalous[idx] = elements.anomalous();
            }
        }

        Ok(GreensFunctions {
            functions: SpectralPair { normal, anomalous },
            bound_state,
            state: self.state,
        })
    }
}

/// The Nambu Green's functions sampled on the grid, with the in-gap poles held separately
#[derive(Clone, Debug)]
pub struct GreensFunctions {
    functions: SpectralPair,
    bound_state: AndreevBoundState,
    state: DensityState,
}

impl GreensFunctions {
    /// The normal and anomalous functions
    pub fn as_pair(&self) -> &SpectralPair {
        &self.functions
    }

    /// The normal Green's function
    pub fn normal(&self) -> &Array1<Complex64> {
        &self.functions.normal
    }

    /// The anomalous Green's function
    pub fn anomalous(&self) -> &Array1<Complex64> {
        &self.functions.anomalous
    }

    /// The Andreev bound state
    pub fn bound_state(&self) -> &AndreevBoundState {
        &self.bound_state
    }

    /// The static state the functions were built with
    pub fn state(&self) -> DensityState {
        self.state
    }

    fn channel(&self, channel: Channel) -> &Array1<Complex64> {
        match channel {
            Channel::Normal => &self.functions.normal,
            Channel::Anomalous => &self.functions.anomalous,
        }
    }

    /// `-Im G / π` without the bound state, the grid points adjacent to each pole are zeroed
    pub fn continuous_spectral_density(&self, grid: &EnergyGrid, channel: Channel) -> Array1<f64> {
        self.channel(channel)
            .iter()
            .zip(grid.positions())
            .map(|(value, position)| {
                if self.bound_state.is_adjacent(position) {
                    0.
                } else {
                    -value.im / PI
                }
            })
            .collect()
    }

    /// `-Im G / π` with the bound state delta functions distributed onto the neighbouring grid points
    pub fn spectral_density(&self, grid: &EnergyGrid, channel: Channel) -> Array1<f64> {
        let mut density = self.continuous_spectral_density(grid, channel);
        for pole in self.bound_state.poles() {
            let residue = match channel {
                Channel::Normal => pole.residues().normal,
                Channel::Anomalous => pole.residues().anomalous,
            };
            for (position, weight) in pole.positions().iter().zip(pole.weights()) {
                density[position.index()] += residue * weight / grid.step();
            }
        }
        density
    }

    /// The functions with the bound state delta functions added as imaginary spikes, used for output
    pub fn with_bound_state_weights(&self, grid: &EnergyGrid) -> SpectralPair {
        let mut pair = self.functions.clone();
        for pole in self.bound_state.poles() {
            for (position, weight) in pole.positions().iter().zip(pole.weights()) {
                let scale = -PI * weight / grid.step();
                pair.normal[position.index()] = Complex64::new(
                    pair.normal[position.index()].re,
                    scale * pole.residues().normal,
                );
                pair.anomalous[position.index()] = Complex64::new(
                    pair.anomalous[position.index()].re,
                    scale * pole.residues().anomalous,
                );
            }
        }
        pair
    }
}

#[cfg(test)]
mod test {
    use super::{Channel, DensityState, GreensFunctionBuilder, GreensFunctionError};
    use crate::{hamiltonian::ModelParameters, spectral::EnergyGridBuilder};
    use approx::assert_relative_eq;

    fn grid() -> crate::spectral::EnergyGrid {
        EnergyGridBuilder::new()
            .with_step(0.01)
            .with_exponent(11)
            .build()
            .unwrap()
    }

    #[test]
    fn non_interacting_bound_state_solves_the_determinant() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0., 0.).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build()
            .unwrap();
        let w0 = greens_functions.bound_state().energy();
        assert!(w0 > 0. && w0 < 1.);
        // At U = 0, ε = 0 and Φ = 0 the determinant is a² - Δ_Φ², so w0 (1 + Γ/r) = Δ Γ / r
        let r = (1. - w0 * w0).sqrt();
        assert_relative_eq!(w0 * (r + 1.), 1., epsilon = 1e-10);
        assert_relative_eq!(
            greens_functions.bound_state().lower().energy(),
            -w0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn residues_are_particle_hole_symmetric_at_half_filling() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0., 0.3).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .with_state(DensityState::new(0.5, 0.))
            .build()
            .unwrap();
        let [lower, upper, anomalous] = greens_functions.bound_state().reported_residues();
        assert!(lower > 0.);
        assert_relative_eq!(lower, upper, epsilon = 1e-8);
        assert!(anomalous < 0.);
        // The hole residue at -w0 mirrors the particle residue at +w0
        assert_relative_eq!(
            greens_functions.bound_state().lower().residues().hole,
            upper,
            epsilon = 1e-8
        );
    }

    #[test]
    fn spectral_density_holds_the_bound_state_weight() {
        let grid = grid();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0.2, 0.).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build()
            .unwrap();
        let continuous = greens_functions.continuous_spectral_density(&grid, Channel::Normal);
        let full = greens_functions.spectral_density(&grid, Channel::Normal);
        let difference: f64 = full
            .iter()
            .zip(continuous.iter())
            .map(|(f, c)| f - c)
            .sum::<f64>()
            * grid.step();
        let [lower, upper, _] = greens_functions.bound_state().reported_residues();
        assert_relative_eq!(difference, lower + upper, epsilon = 1e-10);
    }

    #[test]
    fn vanishing_pairing_has_no_bound_state() {
        let grid = grid();
        // Symmetric coupling at Φ = π closes the induced gap
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0., 1.).unwrap();
        let result = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build();
        assert!(matches!(result, Err(GreensFunctionError::NoBoundState(_, _))));
    }
}
