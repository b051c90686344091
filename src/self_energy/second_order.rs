//! The second order self-energy from the Schwinger-Dyson equation
//!
//! With `BΓ = -Im χΓ / π` split at zero frequency, the spectral function of the self-energy in
//! channel `x` is
//!
//! ```text
//! A_Σx(ω) = ∫ A_x,emp(ω - ν) BΓ(ν) θ(ν) dν - ∫ A_x,occ(ω - ν) BΓ(ν) θ(-ν) dν
//! ```
//!
//! so `Im Σx = -π A_Σx`. The real part is recovered by Kramers-Kronig.
use super::bubbles::split_at_fermi_level;
use crate::{
    greens_functions::{Channel, GreensFunctions},
    spectral::{convolve_on_grid, EnergyGrid, KramersKronig},
};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// The retarded self-energy in one channel for the kernel `χΓ`
pub(super) fn schwinger_dyson(
    greens_functions: &GreensFunctions,
    kernel: &Array1<Complex64>,
    channel: Channel,
    grid: &EnergyGrid,
    transform: &KramersKronig,
) -> Array1<Complex64> {
    let kernel_density = kernel.mapv(|chi| -chi.im / PI);
    let (negative, positive) = split_at_fermi_level(&kernel_density, grid);

    let density = greens_functions.spectral_density(grid, channel);
    let (occupied, empty) = split_at_fermi_level(&density, grid);

    let emission = convolve_on_grid(&empty, &positive, grid);
    let absorption = convolve_on_grid(&occupied, &negative, grid);
    let imaginary: Array1<f64> = emission
        .iter()
        .zip(absorption.iter())
        .map(|(e, a)| -PI * (e - a))
        .collect();
    transform.complete_from_imaginary(&imaginary)
}
