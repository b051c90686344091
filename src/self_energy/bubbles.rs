//! Two-particle bubbles of the mean-field Green's functions
//!
//! At zero temperature the spectral function of a bubble `χ(τ) = G(τ) G(-τ)` is a correlation of the
//! occupied and empty parts of the single-particle spectral density
//!
//! ```text
//! C(ν) = ∫ A_occ(ω) A_emp(ω + ν) dω
//! Im χ(ν) = -π [C(ν) - C(-ν)]
//! ```
//!
//! and the real part follows from Kramers-Kronig.
use crate::{
    greens_functions::{Channel, GreensFunctions},
    spectral::{correlate_on_grid, fit_tail, EnergyGrid, KramersKronig, SpectralPair, TailSettings},
};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Split a spectral density at the Fermi level into its occupied and empty parts, `θ(0) = 1/2`
pub(super) fn split_at_fermi_level(
    density: &Array1<f64>,
    grid: &EnergyGrid,
) -> (Array1<f64>, Array1<f64>) {
    let occupation = |energy: f64| {
        if energy < 0. {
            1.
        } else if energy > 0. {
            0.
        } else {
            0.5
        }
    };
    let occupied = density
        .iter()
        .zip(grid.points().iter())
        .map(|(&a, &e)| a * occupation(e))
        .collect();
    let empty = density
        .iter()
        .zip(grid.points().iter())
        .map(|(&a, &e)| a * (1. - occupation(e)))
        .collect();
    (occupied, empty)
}

/// `B(ν) = C(ν) - C(-ν)` for a single spectral density
fn bubble_spectrum(density: &Array1<f64>, grid: &EnergyGrid) -> Array1<f64> {
    let (occupied, empty) = split_at_fermi_level(density, grid);
    let correlation = correlate_on_grid(&occupied, &empty, grid);
    let reversed = correlation.iter().rev();
    correlation
        .iter()
        .zip(reversed)
        .map(|(forward, backward)| forward - backward)
        .collect()
}

/// The normal `χn` and anomalous `χa` bubbles
#[derive(Clone, Debug)]
pub struct Bubbles {
    values: SpectralPair,
}

impl Bubbles {
    pub(super) fn new(
        greens_functions: &GreensFunctions,
        grid: &EnergyGrid,
        transform: &KramersKronig,
        tail: Option<&TailSettings>,
    ) -> Self {
        let retarded = |channel: Channel| -> Array1<Complex64> {
            let density = greens_functions.spectral_density(grid, channel);
            let imaginary = bubble_spectrum(&density, grid).mapv(|b| -PI * b);
            transform.complete_from_imaginary(&imaginary)
        };
        let mut normal = retarded(Channel::Normal);
        let anomalous = retarded(Channel::Anomalous);
        if let Some(tail) = tail {
            fit_tail(grid, &mut normal, &tail.window, tail.bubble);
        }
        tracing::debug!(
            "Static bubbles: chi_n(0) = {}, chi_a(0) = {}",
            normal[grid.centre().index()].re,
            anomalous[grid.centre().index()].re
        );
        Self {
            values: SpectralPair { normal, anomalous },
        }
    }

    /// Both bubbles
    pub fn as_pair(&self) -> &SpectralPair {
        &self.values
    }

    /// The particle-hole bubble `χn`
    pub fn normal(&self) -> &Array1<Complex64> {
        &self.values.normal
    }

    /// The anomalous bubble `χa`
    pub fn anomalous(&self) -> &Array1<Complex64> {
        &self.values.anomalous
    }

    /// The interaction kernel `χΓ = U² (χn + χa)` of the second order self-energy
    pub fn kernel(&self, interaction: f64) -> Array1<Complex64> {
        let scale = interaction * interaction;
        self.values
            .normal
            .iter()
            .zip(self.values.anomalous.iter())
            .map(|(n, a)| (n + a) * scale)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::Bubbles;
    use crate::{
        greens_functions::GreensFunctionBuilder,
        hamiltonian::ModelParameters,
        spectral::{EnergyGridBuilder, KramersKronig},
    };
    use approx::assert_relative_eq;

    #[test]
    fn bubble_spectrum_is_odd_and_causal() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.01)
            .with_exponent(11)
            .build()
            .unwrap();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0.2, 0.4).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build()
            .unwrap();
        let transform = KramersKronig::new(&grid);
        let bubbles = Bubbles::new(&greens_functions, &grid, &transform, None);

        let n = grid.len();
        let scale = bubbles
            .normal()
            .iter()
            .map(|x| x.im.abs())
            .fold(0., f64::max);
        assert!(scale > 0.);
        for idx in 0..n {
            let value = bubbles.normal()[idx];
            let mirrored = bubbles.normal()[n - 1 - idx];
            assert_relative_eq!(value.im, -mirrored.im, epsilon = 1e-12 * scale);
            // Positive frequencies absorb
            if grid.points()[idx] > 0. {
                assert!(value.im <= 1e-10 * scale);
            }
        }
        // A negative imaginary part at positive frequency gives a negative static bubble
        assert!(bubbles.normal()[grid.centre().index()].re < 0.);
    }

    #[test]
    fn kernel_scales_with_the_interaction_squared() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.02)
            .with_exponent(10)
            .build()
            .unwrap();
        let parameters = ModelParameters::from_reduced(0., 1., 0.5, 1., 0., 0.).unwrap();
        let greens_functions = GreensFunctionBuilder::new()
            .with_parameters(&parameters)
            .with_grid(&grid)
            .build()
            .unwrap();
        let transform = KramersKronig::new(&grid);
        let bubbles = Bubbles::new(&greens_functions, &grid, &transform, None);
        let unit = bubbles.kernel(1.);
        let doubled = bubbles.kernel(2.);
        for (u, d) in unit.iter().zip(doubled.iter()) {
            assert_relative_eq!(d.re, 4. * u.re, epsilon = 1e-12);
            assert_relative_eq!(d.im, 4. * u.im, epsilon = 1e-12);
        }
    }
}
