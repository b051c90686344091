use super::IntegrationRule;
use crate::{
    constants::{MAX_GRID_EXPONENT, MIN_GRID_EXPONENT},
    error::ConfigurationError,
};
use ndarray::Array1;
use num_complex::Complex64;

/// Type-state builder for the `EnergyGrid`
pub struct EnergyGridBuilder<RefStep, RefExponent> {
    step: RefStep,
    exponent: RefExponent,
    integration_rule: IntegrationRule,
}

impl EnergyGridBuilder<(), ()> {
    /// Initialise an empty builder
    pub fn new() -> Self {
        Self {
            step: (),
            exponent: (),
            integration_rule: IntegrationRule::default(),
        }
    }
}

impl<RefStep, RefExponent> EnergyGridBuilder<RefStep, RefExponent> {
    /// Attach the spacing between neighbouring grid points
    pub fn with_step(self, step: f64) -> EnergyGridBuilder<f64, RefExponent> {
        EnergyGridBuilder {
            step,
            exponent: self.exponent,
            integration_rule: self.integration_rule,
        }
    }

    /// Attach the exponent `M`, the grid holds `2^M - 1` points
    pub fn with_exponent(self, exponent: u32) -> EnergyGridBuilder<RefStep, u32> {
        EnergyGridBuilder {
            step: self.step,
            exponent,
            integration_rule: self.integration_rule,
        }
    }

    /// Attach the quadrature used by `EnergyGrid::integrate`
    pub fn with_integration_rule(self, integration_rule: IntegrationRule) -> Self {
        EnergyGridBuilder {
            step: self.step,
            exponent: self.exponent,
            integration_rule,
        }
    }
}

impl EnergyGridBuilder<f64, u32> {
    /// Build the grid, failing if the requested size cannot be represented
    pub fn build(self) -> Result<EnergyGrid, ConfigurationError> {
        if !self.step.is_finite() || self.step <= 0. {
            return Err(ConfigurationError::EnergyStep(self.step));
        }
        if !(MIN_GRID_EXPONENT..=MAX_GRID_EXPONENT).contains(&self.exponent) {
            return Err(ConfigurationError::GridExponent(
                self.exponent,
                MIN_GRID_EXPONENT,
                MAX_GRID_EXPONENT,
            ));
        }
        let num_points = 1_usize
            .checked_shl(self.exponent)
            .and_then(|n| n.checked_sub(1))
            .ok_or(ConfigurationError::GridOverflow(self.exponent))?;
        // The padded transforms need three times the grid length
        num_points
            .checked_mul(3)
            .and_then(|n| n.checked_next_power_of_two())
            .ok_or(ConfigurationError::GridOverflow(self.exponent))?;

        let centre = (num_points - 1) / 2;
        let points = (0..num_points)
            .map(|idx| (idx as f64 - centre as f64) * self.step)
            .collect();

        Ok(EnergyGrid {
            step: self.step,
            points,
            integration_rule: self.integration_rule,
        })
    }
}

/// A typed index into an `EnergyGrid`
///
/// Positions can only be created through the grid, which checks they are in bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridPosition(usize);

impl GridPosition {
    /// The raw index into the sampled arrays
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A uniform energy grid of `2^M - 1` points, symmetric about zero
#[derive(Clone, Debug)]
pub struct EnergyGrid {
    step: f64,
    points: Array1<f64>,
    integration_rule: IntegrationRule,
}

impl EnergyGrid {
    /// The number of points in the grid
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, an `EnergyGrid` holds at least seven points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The spacing `dE`
    pub fn step(&self) -> f64 {
        self.step
    }

    /// The grid energies in increasing order
    pub fn points(&self) -> &Array1<f64> {
        &self.points
    }

    /// The largest energy on the grid
    pub fn maximum_energy(&self) -> f64 {
        self.points[self.len() - 1]
    }

    /// Checked conversion of a raw index into a `GridPosition`
    pub fn position(&self, index: usize) -> Result<GridPosition, ConfigurationError> {
        if index < self.len() {
            Ok(GridPosition(index))
        } else {
            Err(ConfigurationError::GridPosition(index, self.len()))
        }
    }

    /// Iterate over every position of the grid in increasing energy
    pub fn positions(&self) -> impl Iterator<Item = GridPosition> {
        (0..self.len()).map(GridPosition)
    }

    /// The position of `ω = 0`
    pub fn centre(&self) -> GridPosition {
        GridPosition((self.len() - 1) / 2)
    }

    /// The first point of the grid
    pub fn first(&self) -> GridPosition {
        GridPosition(0)
    }

    /// The last point of the grid
    pub fn last(&self) -> GridPosition {
        GridPosition(self.len() - 1)
    }

    /// The energy at `position`
    pub fn energy_at(&self, position: GridPosition) -> f64 {
        self.points[position.0]
    }

    /// The position holding the negated energy
    pub fn mirror(&self, position: GridPosition) -> GridPosition {
        GridPosition(self.len() - 1 - position.0)
    }

    /// The position of the grid point nearest to `energy`, if it lies on the grid
    pub fn nearest_position(&self, energy: f64) -> Option<GridPosition> {
        let fractional = self.fractional_index(energy)?;
        Some(GridPosition(fractional.round() as usize))
    }

    fn fractional_index(&self, energy: f64) -> Option<f64> {
        let fractional = (energy - self.points[0]) / self.step;
        (energy.is_finite() && (0. ..=(self.len() - 1) as f64).contains(&fractional))
            .then(|| fractional)
    }

    /// The two grid positions bracketing `energy`
    pub fn bracketing_positions(&self, energy: f64) -> Option<[GridPosition; 2]> {
        let fractional = self.fractional_index(energy)?;
        let lower = (fractional.floor() as usize).min(self.len() - 2);
        Some([GridPosition(lower), GridPosition(lower + 1)])
    }

    /// The linear interpolation weights of the positions returned by `bracketing_positions`
    pub fn bracketing_weights(&self, energy: f64) -> Option<[f64; 2]> {
        let [lower, _] = self.bracketing_positions(energy)?;
        let fractional = (energy - self.points[0]) / self.step - lower.0 as f64;
        Some([1. - fractional, fractional])
    }

    /// Linearly interpolate a sampled function, vanishing outside the grid
    pub fn interpolate(&self, values: &Array1<Complex64>, energy: f64) -> Complex64 {
        match (
            self.bracketing_positions(energy),
            self.bracketing_weights(energy),
        ) {
            (Some([lower, upper]), Some([w_lower, w_upper])) => {
                values[lower.0] * w_lower + values[upper.0] * w_upper
            }
            _ => Complex64::new(0., 0.),
        }
    }

    /// Integrate a sampled function between two positions, inclusive, with the grid's quadrature
    pub fn integrate(
        &self,
        integrand: &Array1<f64>,
        lower: GridPosition,
        upper: GridPosition,
    ) -> f64 {
        if upper <= lower {
            return 0.;
        }
        let weights = self
            .integration_rule
            .generate_weights(upper.0 - lower.0 + 1);
        integrand
            .iter()
            .skip(lower.0)
            .zip(weights.iter())
            .fold(0., |sum, (&point, &weight)| sum + point * weight)
            * self.step
    }
}

#[cfg(test)]
mod test {
    use super::EnergyGridBuilder;
    use crate::error::ConfigurationError;
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use proptest::prelude::*;

    #[test]
    fn grid_is_symmetric_and_holds_zero() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.1)
            .with_exponent(5)
            .build()
            .unwrap();
        assert_eq!(grid.len(), 31);
        assert_eq!(grid.energy_at(grid.centre()), 0.);
        for (idx, window) in grid.points().windows(2).into_iter().enumerate() {
            assert!(window[1] > window[0], "not increasing at {}", idx);
        }
        for idx in 0..grid.len() {
            let position = grid.position(idx).unwrap();
            assert_eq!(
                grid.energy_at(position),
                -grid.energy_at(grid.mirror(position))
            );
        }
        assert_relative_eq!(grid.maximum_energy(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn oversize_grids_are_rejected() {
        let result = EnergyGridBuilder::new()
            .with_step(0.1)
            .with_exponent(64)
            .build();
        assert!(matches!(result, Err(ConfigurationError::GridExponent(64, _, _))));

        let result = EnergyGridBuilder::new()
            .with_step(0.)
            .with_exponent(8)
            .build();
        assert!(matches!(result, Err(ConfigurationError::EnergyStep(_))));
    }

    #[test]
    fn positions_outside_the_grid_are_rejected() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.1)
            .with_exponent(4)
            .build()
            .unwrap();
        assert!(grid.position(14).is_ok());
        assert!(grid.position(15).is_err());
        assert!(grid.bracketing_positions(10.).is_none());
    }

    #[test]
    fn trapezium_integrates_a_line_exactly() {
        let grid = EnergyGridBuilder::new()
            .with_step(0.25)
            .with_exponent(5)
            .build()
            .unwrap();
        let integrand: Array1<f64> = grid.points().mapv(|x| 2. * x + 1.);
        let value = grid.integrate(&integrand, grid.first(), grid.centre());
        // Integral of 2x + 1 over [-3.75, 0]
        assert_relative_eq!(value, -3.75f64.powi(2) + 3.75, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn bracketing_weights_reproduce_the_energy(energy in -3.0f64..3.0) {
            let grid = EnergyGridBuilder::new()
                .with_step(0.1)
                .with_exponent(6)
                .build()
                .unwrap();
            let [lower, upper] = grid.bracketing_positions(energy).unwrap();
            let [w_lower, w_upper] = grid.bracketing_weights(energy).unwrap();
            prop_assert!((w_lower + w_upper - 1.).abs() < 1e-12);
            let reconstructed = w_lower * grid.energy_at(lower) + w_upper * grid.energy_at(upper);
            prop_assert!((reconstructed - energy).abs() < 1e-10);
        }
    }
}
