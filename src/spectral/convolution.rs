//! Discrete convolutions on the `EnergyGrid`, evaluated with zero-padded FFTs
use super::EnergyGrid;
use ndarray::Array1;
use num_complex::Complex64;
use rustfft::FftPlanner;

/// The full linear convolution of two real sequences, of length `lhs.len() + rhs.len() - 1`
pub(crate) fn linear_convolution(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    if lhs.is_empty() || rhs.is_empty() {
        return Vec::new();
    }
    let len = lhs.len() + rhs.len() - 1;
    let fft_len = len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut lhs = zero_padded(lhs, fft_len);
    let mut rhs = zero_padded(rhs, fft_len);
    forward.process(&mut lhs);
    forward.process(&mut rhs);
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l *= r;
    }
    inverse.process(&mut lhs);

    let norm = fft_len as f64;
    lhs.iter().take(len).map(|x| x.re / norm).collect()
}

pub(crate) fn zero_padded(values: &[f64], len: usize) -> Vec<Complex64> {
    let mut buffer = vec![Complex64::new(0., 0.); len];
    for (slot, &value) in buffer.iter_mut().zip(values) {
        slot.re = value;
    }
    buffer
}

/// `(f * g)(ω) = ∫ f(ω - x) g(x) dx` sampled on the grid, with both functions vanishing off-grid
pub(crate) fn convolve_on_grid(f: &Array1<f64>, g: &Array1<f64>, grid: &EnergyGrid) -> Array1<f64> {
    let full = linear_convolution(&f.to_vec(), &g.to_vec());
    let offset = grid.centre().index();
    (0..grid.len())
        .map(|k| full[k + offset] * grid.step())
        .collect()
}

/// `C(ν) = ∫ f(ω) g(ω + ν) dω` sampled on the grid
pub(crate) fn correlate_on_grid(
    f: &Array1<f64>,
    g: &Array1<f64>,
    grid: &EnergyGrid,
) -> Array1<f64> {
    let reversed: Array1<f64> = f.iter().rev().copied().collect();
    convolve_on_grid(&reversed, g, grid)
}

#[cfg(test)]
mod test {
    use super::{convolve_on_grid, correlate_on_grid, linear_convolution};
    use crate::spectral::EnergyGridBuilder;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    #[test]
    fn fft_convolution_matches_direct_sum() {
        let lhs = [1., 2., -1., 0.5];
        let rhs = [0.25, -3., 4.];
        let fast = linear_convolution(&lhs, &rhs);
        assert_eq!(fast.len(), 6);
        for (k, value) in fast.iter().enumerate() {
            let direct: f64 = (0..lhs.len())
                .filter(|&i| k >= i && k - i < rhs.len())
                .map(|i| lhs[i] * rhs[k - i])
                .sum();
            assert_relative_eq!(*value, direct, epsilon = 1e-12);
        }
    }

    #[test]
    fn convolution_of_gaussians_is_gaussian() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.02)
            .with_exponent(10)
            .build()
            .unwrap();
        let sigma = 0.5_f64;
        let gaussian = |x: f64, s: f64| {
            (-x * x / (2. * s * s)).exp() / (s * (2. * std::f64::consts::PI).sqrt())
        };
        let f: Array1<f64> = grid.points().mapv(|x| gaussian(x - 1., sigma));
        let g: Array1<f64> = grid.points().mapv(|x| gaussian(x, sigma));
        let result = convolve_on_grid(&f, &g, &grid);
        let width = sigma * 2_f64.sqrt();
        for (x, value) in grid.points().iter().zip(result.iter()) {
            assert_relative_eq!(*value, gaussian(x - 1., width), epsilon = 1e-6);
        }
    }

    #[test]
    fn correlation_shifts_the_second_argument() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.02)
            .with_exponent(10)
            .build()
            .unwrap();
        let sigma = 0.3_f64;
        let gaussian = |x: f64, s: f64| {
            (-x * x / (2. * s * s)).exp() / (s * (2. * std::f64::consts::PI).sqrt())
        };
        // ∫ f(ω) g(ω + ν) dω peaks where ν = 1.5 - (-0.5)
        let f: Array1<f64> = grid.points().mapv(|x| gaussian(x + 0.5, sigma));
        let g: Array1<f64> = grid.points().mapv(|x| gaussian(x - 1.5, sigma));
        let result = correlate_on_grid(&f, &g, &grid);
        let width = sigma * 2_f64.sqrt();
        for (x, value) in grid.points().iter().zip(result.iter()) {
            assert_relative_eq!(*value, gaussian(x - 2., width), epsilon = 1e-6);
        }
    }
}
