//! Andreev bound states
//!
//! Inside the gap the lead functions are real and the Nambu determinant `D(ω)` only vanishes at
//! the Andreev bound states. These are found by scanning `Re D` at grid resolution for sign changes,
//! choosing the change closest to a hint and refining it with Brent's method. The residue of a
//! Green's function `N(ω) / D(ω)` at a simple pole `z` is `N(z) / D'(z)`.
use super::GreensFunctionError;
use crate::{
    constants::{BOUND_STATE_TOLERANCE, MAXIMUM_BOUND_STATE_ITERATIONS},
    spectral::{EnergyGrid, GridPosition},
    utilities::root_finding::brent_root,
};
use num_complex::Complex64;

/// Residues of the three Nambu components at a single pole
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoleResidues {
    /// Residue of the particle Green's function
    pub normal: f64,
    /// Residue of the hole Green's function
    pub hole: f64,
    /// Residue of the anomalous Green's function
    pub anomalous: f64,
}

/// A simple in-gap pole of the Nambu Green's function
#[derive(Clone, Copy, Debug)]
pub struct Pole {
    energy: f64,
    positions: [GridPosition; 2],
    weights: [f64; 2],
    residues: PoleResidues,
}

impl Pole {
    pub(crate) fn new(
        energy: f64,
        grid: &EnergyGrid,
        residues: PoleResidues,
    ) -> Result<Self, GreensFunctionError> {
        let positions = grid
            .bracketing_positions(energy)
            .ok_or(GreensFunctionError::PoleOffGrid(energy))?;
        let weights = grid
            .bracketing_weights(energy)
            .ok_or(GreensFunctionError::PoleOffGrid(energy))?;
        Ok(Self {
            energy,
            positions,
            weights,
            residues,
        })
    }

    /// The energy of the pole
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// The grid positions either side of the pole
    pub fn positions(&self) -> [GridPosition; 2] {
        self.positions
    }

    /// The linear weights distributing a delta function at the pole onto `positions`
    pub fn weights(&self) -> [f64; 2] {
        self.weights
    }

    /// The residues of the Green's functions at the pole
    pub fn residues(&self) -> &PoleResidues {
        &self.residues
    }
}

/// The pair of poles at `±w0` forming the Andreev bound state
#[derive(Clone, Copy, Debug)]
pub struct AndreevBoundState {
    lower: Pole,
    upper: Pole,
}

impl AndreevBoundState {
    pub(crate) fn new(lower: Pole, upper: Pole) -> Self {
        Self { lower, upper }
    }

    /// The bound state energy `w0 > 0`
    pub fn energy(&self) -> f64 {
        self.upper.energy
    }

    /// The pole at `-w0`
    pub fn lower(&self) -> &Pole {
        &self.lower
    }

    /// The pole at `+w0`
    pub fn upper(&self) -> &Pole {
        &self.upper
    }

    /// Both poles
    pub fn poles(&self) -> [&Pole; 2] {
        [&self.lower, &self.upper]
    }

    /// The reported residues: the normal function at `-w0` and `+w0`, and the anomalous function at `-w0`
    pub fn reported_residues(&self) -> [f64; 3] {
        [
            self.lower.residues.normal,
            self.upper.residues.normal,
            self.lower.residues.anomalous,
        ]
    }

    /// Whether `position` is adjacent to either pole
    pub(crate) fn is_adjacent(&self, position: GridPosition) -> bool {
        self.poles()
            .iter()
            .any(|pole| pole.positions.contains(&position))
    }
}

/// Find the root of `determinant` in `interval` closest to `hint`
///
/// The interval is sampled with spacing no larger than `resolution`. Samples where the determinant
/// cannot be evaluated should return `NaN`, they never form part of a bracket.
pub(crate) fn locate_pole(
    determinant: &dyn Fn(f64) -> f64,
    [lower, upper]: [f64; 2],
    hint: f64,
    resolution: f64,
) -> Result<f64, GreensFunctionError> {
    let num_intervals = (((upper - lower) / resolution).ceil() as usize).clamp(16, 1 << 20);
    let samples = (0..=num_intervals)
        .map(|idx| {
            let energy = lower + (upper - lower) * idx as f64 / num_intervals as f64;
            (energy, determinant(energy))
        })
        .collect::<Vec<_>>();

    let bracket = samples
        .windows(2)
        .filter(|pair| {
            let (left, right) = (pair[0].1, pair[1].1);
            left.is_finite()
                && right.is_finite()
                && left * right <= 0.
                && (left != 0. || right != 0.)
        })
        .map(|pair| [pair[0].0, pair[1].0])
        .min_by(|a, b| {
            let distance = |bracket: &[f64; 2]| (0.5 * (bracket[0] + bracket[1]) - hint).abs();
            distance(a).total_cmp(&distance(b))
        })
        .ok_or(GreensFunctionError::NoBoundState(lower, upper))?;

    let function = |energy: f64| -> anyhow::Result<f64> { Ok(determinant(energy)) };
    Ok(brent_root(
        &function,
        bracket,
        BOUND_STATE_TOLERANCE,
        MAXIMUM_BOUND_STATE_ITERATIONS,
    )?)
}

/// The residue `N(z) / D'(z)` of `numerator / determinant` at the simple pole `z`
///
/// The derivative is a fourth order central difference with spacing `step`.
pub fn residue_at(
    numerator: &dyn Fn(f64) -> Complex64,
    determinant: &dyn Fn(f64) -> Complex64,
    pole: f64,
    step: f64,
) -> Complex64 {
    let derivative = (determinant(pole - 2. * step) - 8. * determinant(pole - step)
        + 8. * determinant(pole + step)
        - determinant(pole + 2. * step))
        / (12. * step);
    numerator(pole) / derivative
}

#[cfg(test)]
mod test {
    use super::{locate_pole, residue_at};
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn residue_of_a_synthetic_pole() {
        // f(ω) = (ω + 2) / ((ω - 0.3)(ω + 0.7)) has residue 2.3 / 1.0 at ω = 0.3
        let numerator = |omega: f64| Complex64::new(omega + 2., 0.);
        let determinant = |omega: f64| Complex64::new((omega - 0.3) * (omega + 0.7), 0.);
        let residue = residue_at(&numerator, &determinant, 0.3, 1e-3);
        assert_relative_eq!(residue.re, 2.3, epsilon = 1e-10);
        assert_relative_eq!(residue.im, 0., epsilon = 1e-14);
    }

    #[test]
    fn pole_nearest_the_hint_is_selected() {
        // Roots at 0.2 and 0.7 inside (0, 1)
        let determinant = |omega: f64| (omega - 0.2) * (omega - 0.7);
        let near_low = locate_pole(&determinant, [1e-9, 1. - 1e-9], 0.1, 0.01).unwrap();
        assert_relative_eq!(near_low, 0.2, epsilon = 1e-10);
        let near_high = locate_pole(&determinant, [1e-9, 1. - 1e-9], 0.9, 0.01).unwrap();
        assert_relative_eq!(near_high, 0.7, epsilon = 1e-10);
    }

    #[test]
    fn missing_sign_change_is_an_error() {
        let determinant = |omega: f64| omega * omega + 0.1;
        assert!(locate_pole(&determinant, [1e-9, 1.], 0.5, 0.01).is_err());
        // Samples which cannot be evaluated never form a bracket
        let undefined = |_: f64| f64::NAN;
        assert!(locate_pole(&undefined, [1e-9, 1.], 0.5, 0.01).is_err());
    }
}
