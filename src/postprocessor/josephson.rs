//! The Josephson current
//!
//! The supercurrent is the phase derivative of the free energy. For the dot coupled to two BCS leads
//! it splits into a band contribution from the continuum outside the gap and the contribution of the
//! occupied Andreev state at `-w0`
//!
//! ```text
//! J_band = -(4/π) ∫_{ω<0} Im[Ga(ω) ∂Δ_Φ(ω)/∂Φ] dω
//! J_gap  = 4 Ra(-w0) ∂Δ_Φ(-w0)/∂Φ
//! ```
use crate::{
    greens_functions::GreensFunctions, hamiltonian::ModelParameters, spectral::EnergyGrid,
};
use ndarray::Array1;
use std::f64::consts::PI;

/// The two contributions to the supercurrent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JosephsonCurrent {
    /// Contribution of the continuum
    pub band: f64,
    /// Contribution of the Andreev bound state
    pub gap: f64,
}

impl JosephsonCurrent {
    /// The total supercurrent
    pub fn total(&self) -> f64 {
        self.band + self.gap
    }
}

pub(super) fn josephson_current(
    parameters: &ModelParameters,
    greens_functions: &GreensFunctions,
    grid: &EnergyGrid,
) -> JosephsonCurrent {
    let bound_state = greens_functions.bound_state();
    let integrand: Array1<f64> = grid
        .positions()
        .map(|position| {
            if bound_state.is_adjacent(position) {
                return 0.;
            }
            parameters
                .pairing_phase_derivative(grid.energy_at(position))
                .map(|derivative| (greens_functions.anomalous()[position.index()] * derivative).im)
                .unwrap_or(0.)
        })
        .collect();
    let band = -4. / PI * grid.integrate(&integrand, grid.first(), grid.centre());

    let lower = bound_state.lower();
    let gap = parameters
        .pairing_phase_derivative(lower.energy())
        .map(|derivative| 4. * lower.residues().anomalous * derivative.re)
        .unwrap_or(0.);

    JosephsonCurrent { band, gap }
}
