//! This module provides the discrete energy axis on which every frequency-dependent quantity
//! is sampled, together with the spectral operations acting on it: discrete convolution, the
//! Kramers-Kronig transform and the asymptotic tail fit.
//!
//! Functions are always carried as a normal / anomalous pair in a [`SpectralPair`]. The grid is
//! uniform and symmetric about zero, so reversing the sample order maps `ω -> -ω` exactly.
mod convolution;
mod energy;
mod kramers_kronig;
mod tail;

pub(crate) use convolution::{convolve_on_grid, correlate_on_grid};
pub use energy::{EnergyGrid, EnergyGridBuilder, GridPosition};
pub use kramers_kronig::KramersKronig;
pub use tail::{fit_tail, Parity, TailFit, TailSettings, TailWindow};

use ndarray::Array1;
use num_complex::Complex64;
use serde::Deserialize;

/// A normal and an anomalous complex function sampled on the `EnergyGrid`
#[derive(Clone, Debug)]
pub struct SpectralPair {
    /// The particle (normal) channel
    pub normal: Array1<Complex64>,
    /// The anomalous channel
    pub anomalous: Array1<Complex64>,
}

impl SpectralPair {
    /// A pair of functions vanishing everywhere on a grid of `num_points`
    pub fn zeros(num_points: usize) -> Self {
        Self {
            normal: Array1::zeros(num_points),
            anomalous: Array1::zeros(num_points),
        }
    }

    /// Whether every sample in both channels vanishes identically
    pub fn is_identically_zero(&self) -> bool {
        self.normal
            .iter()
            .chain(self.anomalous.iter())
            .all(|x| x.re == 0.0 && x.im == 0.0)
    }
}

/// Enum for discrete integration methods
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum IntegrationRule {
    /// Trapezium rule
    Trapezium,
    /// Composite Simpson rule, falls back to the trapezium rule on an even number of points
    Simpson,
    /// Trapezium rule with third order end corrections, needs at least eight points
    ThreePoint,
}

impl Default for IntegrationRule {
    fn default() -> Self {
        IntegrationRule::Trapezium
    }
}

impl IntegrationRule {
    /// Generate the dimensionless weights for `num_points` equidistant samples
    pub(crate) fn generate_weights(&self, num_points: usize) -> Array1<f64> {
        if num_points < 2 {
            return Array1::zeros(num_points);
        }
        let rule = match self {
            IntegrationRule::Simpson if num_points % 2 == 0 => IntegrationRule::Trapezium,
            IntegrationRule::ThreePoint if num_points < 8 => IntegrationRule::Trapezium,
            rule => *rule,
        };
        let last = num_points - 1;
        // A closure generating the weight for a given point index
        let weight = |idx: usize| -> f64 {
            match rule {
                IntegrationRule::Trapezium => {
                    if (idx == 0) | (idx == last) {
                        0.5
                    } else {
                        1.
                    }
                }
                IntegrationRule::Simpson => {
                    if (idx == 0) | (idx == last) {
                        1. / 3.
                    } else if idx % 2 == 0 {
                        2. / 3.
                    } else {
                        4. / 3.
                    }
                }
                IntegrationRule::ThreePoint => {
                    if (idx == 0) | (idx == last) {
                        17. / 48.
                    } else if (idx == 1) | (idx == last - 1) {
                        59. / 48.
                    } else if (idx == 2) | (idx == last - 2) {
                        43. / 48.
                    } else if (idx == 3) | (idx == last - 3) {
                        49. / 48.
                    } else {
                        1.
                    }
                }
            }
        };
        (0..num_points).map(weight).collect()
    }
}
