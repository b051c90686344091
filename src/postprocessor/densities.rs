//! Density functionals
//!
//! At zero temperature the occupied states are those with `ω < 0`, so
//!
//! ```text
//! n = -(1/π) ∫_{ω<0} Im Gn dω + Rn(-w0)
//! μ =  (1/π) ∫_{ω<0} Im Ga dω - Ra(-w0)
//! ```
//!
//! where `R(-w0)` are the residues of the bound state pole below the Fermi level. The normal
//! spectral density decays as `Γ / (π ω²)`, the weight beyond the grid edge is added analytically
//! from the value at the edge.
use crate::{
    greens_functions::{Channel, GreensFunctions},
    spectral::EnergyGrid,
};

/// The weight of a `1 / ω²` tail beyond the grid point at `energy` with density `density`
fn asymptotic_weight(energy: f64, density: f64) -> f64 {
    energy.abs() * density
}

pub(super) fn electron_density(greens_functions: &GreensFunctions, grid: &EnergyGrid) -> f64 {
    let density = greens_functions.continuous_spectral_density(grid, Channel::Normal);
    let band = grid.integrate(&density, grid.first(), grid.centre());
    let tail = asymptotic_weight(grid.energy_at(grid.first()), density[grid.first().index()]);
    band + tail + greens_functions.bound_state().lower().residues().normal
}

pub(super) fn cooper_pair_density(greens_functions: &GreensFunctions, grid: &EnergyGrid) -> f64 {
    let density = greens_functions.continuous_spectral_density(grid, Channel::Anomalous);
    let band = grid.integrate(&density, grid.first(), grid.centre());
    -band - greens_functions.bound_state().lower().residues().anomalous
}

pub(super) fn integrated_density_of_states(
    greens_functions: &GreensFunctions,
    grid: &EnergyGrid,
) -> f64 {
    let density = greens_functions.continuous_spectral_density(grid, Channel::Normal);
    let band = grid.integrate(&density, grid.first(), grid.last());
    let tails = asymptotic_weight(grid.energy_at(grid.first()), density[grid.first().index()])
        + asymptotic_weight(grid.energy_at(grid.last()), density[grid.last().index()]);
    let poles: f64 = greens_functions
        .bound_state()
        .poles()
        .iter()
        .map(|pole| pole.residues().normal)
        .sum();
    band + tails + poles
}

#[cfg(test)]
mod test {
    use crate::{
        greens_functions::{DensityState, GreensFunctionBuilder},
        hamiltonian::ModelParameters,
        postprocessor::{PostProcess, PostProcessorBuilder},
        spectral::EnergyGridBuilder,
    };
    use approx::assert_relative_eq;

    #[test]
    fn spectral_weight_is_normalised() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.005)
            .with_exponent(14)
            .build()
            .unwrap();
        for level in [0., 0.3] {
            let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., level, 0.).unwrap();
            let greens_functions = GreensFunctionBuilder::new()
                .with_parameters(&parameters)
                .with_grid(&grid)
                .build()
                .unwrap();
            let postprocessor = PostProcessorBuilder::new()
                .with_parameters(&parameters)
                .with_grid(&grid)
                .build();
            assert_relative_eq!(
                postprocessor.integrated_density_of_states(&greens_functions),
                1.,
                epsilon = 5e-3
            );
        }
    }

    #[test]
    fn half_filled_density_is_one_half() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.005)
            .with_exponent(14)
            .build()
            .unwrap();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0., 0.).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .with_state(DensityState::new(0.5, 0.))
            .build()
            .unwrap();
        let postprocessor = PostProcessorBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build();
        // The functional itself is only approximately one half
        assert_relative_eq!(
            postprocessor.electron_density(&greens_functions),
            0.5,
            epsilon = 5e-3
        );
        assert_eq!(
            postprocessor.recompute_densities(&greens_functions).occupation,
            0.5
        );
        let pairing = postprocessor.cooper_pair_density(&greens_functions);
        assert!(pairing > 0. && pairing < 0.5);
    }

    #[test]
    fn positive_level_depletes_the_dot() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.005)
            .with_exponent(14)
            .build()
            .unwrap();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0.5, 0.).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build()
            .unwrap();
        let postprocessor = PostProcessorBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build();
        assert!(postprocessor.electron_density(&greens_functions) < 0.5);
    }
}
