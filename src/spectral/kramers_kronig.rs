//! # Kramers-Kronig
//!
//! The real and imaginary parts of a retarded function are Hilbert transforms of one another
//!
//! ```text
//! Re f(ω) =  (1/π) P∫ Im f(x) / (x - ω) dx
//! Im f(ω) = -(1/π) P∫ Re f(x) / (x - ω) dx
//! ```
//!
//! On a uniform grid the principal value integral of a piecewise linear function is exact, and
//! reduces to a discrete convolution with the kernel
//!
//! ```text
//! w(m) = (m + 1) ln|m + 1| - 2 m ln|m| + (m - 1) ln|m - 1|
//! ```
//!
//! which is evaluated with a zero-padded FFT. The kernel spectrum only depends on the grid length so
//! it is computed once per grid.
use super::{convolution::zero_padded, EnergyGrid};
use ndarray::Array1;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::{f64::consts::PI, sync::Arc};

/// Precomputed Hilbert transform on a fixed `EnergyGrid`
pub struct KramersKronig {
    num_points: usize,
    fft_len: usize,
    kernel_spectrum: Vec<Complex64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for KramersKronig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KramersKronig")
            .field("num_points", &self.num_points)
            .field("fft_len", &self.fft_len)
            .finish()
    }
}

fn x_log_x(x: f64) -> f64 {
    if x == 0. {
        0.
    } else {
        x * x.abs().ln()
    }
}

/// Principal value integral of a unit hat function centred `m` grid steps from the singularity
fn kernel_weight(m: f64) -> f64 {
    x_log_x(m + 1.) - 2. * x_log_x(m) + x_log_x(m - 1.)
}

impl KramersKronig {
    /// Precompute the transform for `grid`
    pub fn new(grid: &EnergyGrid) -> Self {
        let num_points = grid.len();
        let offset = (num_points - 1) as f64;
        // Kernel offsets m = k - i run over -(N - 1)..=(N - 1), stored from index m + N - 1
        let kernel = (0..2 * num_points - 1)
            .map(|j| -kernel_weight(j as f64 - offset) / PI)
            .collect::<Vec<_>>();
        let fft_len = (3 * num_points - 2).next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let mut kernel_spectrum = zero_padded(&kernel, fft_len);
        forward.process(&mut kernel_spectrum);

        Self {
            num_points,
            fft_len,
            kernel_spectrum,
            forward,
            inverse,
        }
    }

    fn apply(&self, values: &Array1<f64>) -> Array1<f64> {
        debug_assert_eq!(
            values.len(),
            self.num_points,
            "The transformed function must be sampled on the grid"
        );
        let mut buffer = zero_padded(&values.to_vec(), self.fft_len);
        self.forward.process(&mut buffer);
        for (value, kernel) in buffer.iter_mut().zip(self.kernel_spectrum.iter()) {
            *value *= kernel;
        }
        self.inverse.process(&mut buffer);
        let norm = self.fft_len as f64;
        buffer
            .iter()
            .skip(self.num_points - 1)
            .take(self.num_points)
            .map(|x| x.re / norm)
            .collect()
    }

    /// The real part of a retarded function from its imaginary part
    pub fn real_from_imaginary(&self, imaginary: &Array1<f64>) -> Array1<f64> {
        self.apply(imaginary)
    }

    /// The imaginary part of a retarded function from its real part
    pub fn imaginary_from_real(&self, real: &Array1<f64>) -> Array1<f64> {
        -self.apply(real)
    }

    /// The full retarded function with the given imaginary part
    pub fn complete_from_imaginary(&self, imaginary: &Array1<f64>) -> Array1<Complex64> {
        self.real_from_imaginary(imaginary)
            .iter()
            .zip(imaginary.iter())
            .map(|(&re, &im)| Complex64::new(re, im))
            .collect()
    }
}
