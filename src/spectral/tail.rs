//! # Tail fitting
//!
//! Functions computed by convolution on a finite grid are inaccurate close to the grid edges, where
//! part of the convolution support has been truncated. The tails are replaced by a least-squares fit
//! of the leading terms of the asymptotic expansion, fitted on a window `fit_min <= |ω| <= fit_max`.
use super::EnergyGrid;
use crate::error::ConfigurationError;
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
use num_complex::Complex64;
use serde::Deserialize;

/// The behaviour of a function under `ω -> -ω`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Parity {
    /// Odd real part and even imaginary part, as the normal Green's function
    Odd,
    /// Even real part and odd imaginary part, as the anomalous Green's function and the bubbles
    Even,
}

impl Parity {
    /// Inverse powers of ω in the asymptotic expansion of the real and imaginary parts
    fn powers(&self) -> ([i32; 2], [i32; 2]) {
        match self {
            Parity::Odd => ([1, 3], [2, 4]),
            Parity::Even => ([2, 4], [1, 3]),
        }
    }
}

/// The window of `|ω|` used for the fit, values beyond `fit_max` are replaced
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TailWindow {
    fit_min: f64,
    fit_max: f64,
}

impl TailWindow {
    /// Create a window, failing if it is empty
    pub fn new(fit_min: f64, fit_max: f64) -> Result<Self, ConfigurationError> {
        if !(fit_min.is_finite() && fit_max.is_finite()) || fit_min <= 0. || fit_min >= fit_max {
            return Err(ConfigurationError::TailWindow(fit_min, fit_max));
        }
        Ok(Self { fit_min, fit_max })
    }

    /// The lower edge of the fitting window
    pub fn fit_min(&self) -> f64 {
        self.fit_min
    }

    /// The upper edge of the fitting window
    pub fn fit_max(&self) -> f64 {
        self.fit_max
    }

    fn contains(&self, energy: f64) -> bool {
        (self.fit_min..=self.fit_max).contains(&energy.abs())
    }
}

/// The tail window together with the parity assumed for each family of functions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TailSettings {
    /// The fitting window
    pub window: TailWindow,
    /// Parity of the normal self-energy
    pub normal: Parity,
    /// Parity of the anomalous self-energy
    pub anomalous: Parity,
    /// Parity of the bubbles
    pub bubble: Parity,
}

/// The fitted coefficients of the asymptotic expansion
#[derive(Clone, Copy, Debug)]
pub struct TailFit {
    parity: Parity,
    real: [f64; 2],
    imaginary: [f64; 2],
}

fn least_squares(energies: &[f64], values: &[f64], powers: [i32; 2]) -> Option<[f64; 2]> {
    let design = DMatrix::from_fn(energies.len(), 2, |row, col| {
        energies[row].powi(-powers[col])
    });
    let target = DVector::from_column_slice(values);
    let solution = design.svd(true, true).solve(&target, 1e-14).ok()?;
    Some([solution[0], solution[1]])
}

impl TailFit {
    /// Fit the tails of `values`, or `None` when the grid does not extend beyond the window
    pub fn fit(
        grid: &EnergyGrid,
        values: &Array1<Complex64>,
        window: &TailWindow,
        parity: Parity,
    ) -> Option<Self> {
        if grid.maximum_energy() <= window.fit_max {
            return None;
        }
        let (energies, samples): (Vec<f64>, Vec<Complex64>) = grid
            .points()
            .iter()
            .zip(values.iter())
            .filter(|(energy, _)| window.contains(**energy))
            .map(|(&energy, &value)| (energy, value))
            .unzip();
        if energies.len() < 4 {
            return None;
        }
        let (real_powers, imaginary_powers) = parity.powers();
        let real = least_squares(
            &energies,
            &samples.iter().map(|x| x.re).collect::<Vec<_>>(),
            real_powers,
        )?;
        let imaginary = least_squares(
            &energies,
            &samples.iter().map(|x| x.im).collect::<Vec<_>>(),
            imaginary_powers,
        )?;
        Some(Self {
            parity,
            real,
            imaginary,
        })
    }

    /// Evaluate the asymptotic model at `energy`
    pub fn evaluate(&self, energy: f64) -> Complex64 {
        let (real_powers, imaginary_powers) = self.parity.powers();
        let series = |coefficients: &[f64; 2], powers: [i32; 2]| {
            coefficients
                .iter()
                .zip(powers.iter())
                .map(|(c, &p)| c * energy.powi(-p))
                .sum::<f64>()
        };
        Complex64::new(
            series(&self.real, real_powers),
            series(&self.imaginary, imaginary_powers),
        )
    }

    /// The fitted coefficients of the real part
    pub fn real_coefficients(&self) -> [f64; 2] {
        self.real
    }

    /// The fitted coefficients of the imaginary part
    pub fn imaginary_coefficients(&self) -> [f64; 2] {
        self.imaginary
    }

    /// Overwrite `values` beyond the window with the asymptotic model
    pub fn apply(&self, grid: &EnergyGrid, values: &mut Array1<Complex64>, window: &TailWindow) {
        for (energy, value) in grid.points().iter().zip(values.iter_mut()) {
            if energy.abs() > window.fit_max {
                *value = self.evaluate(*energy);
            }
        }
    }
}

/// Fit and replace the tails of `values` in place, returning the fit if one was made
pub fn fit_tail(
    grid: &EnergyGrid,
    values: &mut Array1<Complex64>,
    window: &TailWindow,
    parity: Parity,
) -> Option<TailFit> {
    match TailFit::fit(grid, values, window, parity) {
        Some(fit) => {
            fit.apply(grid, values, window);
            tracing::trace!(
                "Fitted tail with real coefficients {:?} and imaginary coefficients {:?}",
                fit.real_coefficients(),
                fit.imaginary_coefficients()
            );
            Some(fit)
        }
        None => {
            tracing::debug!(
                "Grid extends to {}, not beyond the tail window {:?}. Skipping the tail fit",
                grid.maximum_energy(),
                window
            );
            None
        }
    }
}
