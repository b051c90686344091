//! Hamiltonian module
//!
//! Holds the parameters of the single impurity Anderson model with two superconducting leads
//!
//! ```text
//! H = ε Σσ nσ + U n↑ n↓ + H_leads + H_coupling
//! ```
//!
//! and the frequency dependent functions which integrating out the BCS leads leaves in the dot
//! Green's function. With `Γ = ΓL + ΓR` and the phase difference `Φ` between the leads
//!
//! - `s(ω) = Γ K(ω)` renormalises the frequency, `ω -> ω (1 + s(ω))`
//! - `Δ_Φ(ω) = Δ γ(Φ) K(ω)` is the induced pairing
//!
//! where `K(ω) = 1 / sqrt(Δ² - (ω + i0)²)` is real inside the gap and imaginary outside. The gauge is
//! chosen so `Δ_Φ` is real, which makes `γ(Φ)` change sign when the phase passes `π`.
//!
//! Parameters are constructed from the reduced command line set
//!
//! ```ignore
//! ModelParameters::from_reduced(u, gap, gamma_right, gamma_ratio, level, phase_over_pi)?;
//! ```
use crate::{
    constants::{GAP_EDGE_TOLERANCE, PHASE_COUPLING_FLOOR},
    error::ConfigurationError,
};
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
/// Immutable parameters of the dot and leads
pub struct ModelParameters {
    /// The on-site Coulomb interaction `U`
    interaction: f64,
    /// The BCS gap `Δ`, identical in both leads
    gap: f64,
    /// Coupling to the right lead `ΓR`
    gamma_right: f64,
    /// Coupling to the left lead `ΓL`
    gamma_left: f64,
    /// Coupling to a normal lead `ΓN`, carried for completeness and always zero
    gamma_normal: f64,
    /// Phase difference `Φ` between the leads in radians
    phase: f64,
    /// The local energy level `ε`, measured from half filling
    level: f64,
}

impl ModelParameters {
    /// Create a validated set of parameters, the phase is given in radians
    pub fn new(
        interaction: f64,
        gap: f64,
        gamma_right: f64,
        gamma_left: f64,
        level: f64,
        phase: f64,
    ) -> Result<Self, ConfigurationError> {
        let all = [interaction, gap, gamma_right, gamma_left, level, phase];
        if all.iter().any(|x| !x.is_finite()) {
            return Err(ConfigurationError::ModelParameter(format!(
                "all parameters must be finite, found {:?}",
                all
            )));
        }
        if gap <= 0. {
            return Err(ConfigurationError::ModelParameter(format!(
                "the gap must be positive, found {}",
                gap
            )));
        }
        if interaction < 0. {
            return Err(ConfigurationError::ModelParameter(format!(
                "the interaction must be non-negative, found {}",
                interaction
            )));
        }
        if gamma_right <= 0. || gamma_left < 0. {
            return Err(ConfigurationError::ModelParameter(format!(
                "the couplings must satisfy GammaR > 0 and GammaL >= 0, found {} and {}",
                gamma_right, gamma_left
            )));
        }
        Ok(Self {
            interaction,
            gap,
            gamma_right,
            gamma_left,
            gamma_normal: 0.,
            phase,
            level,
        })
    }

    /// Create parameters from `(U, Δ, ΓR, ΓL/ΓR, ε, Φ/π)`
    pub fn from_reduced(
        interaction: f64,
        gap: f64,
        gamma_right: f64,
        gamma_ratio: f64,
        level: f64,
        phase_over_pi: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            interaction,
            gap,
            gamma_right,
            gamma_ratio * gamma_right,
            level,
            phase_over_pi * PI,
        )
    }

    /// The interaction `U`
    pub fn interaction(&self) -> f64 {
        self.interaction
    }

    /// The superconducting gap `Δ`
    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// The right coupling `ΓR`
    pub fn gamma_right(&self) -> f64 {
        self.gamma_right
    }

    /// The left coupling `ΓL`
    pub fn gamma_left(&self) -> f64 {
        self.gamma_left
    }

    /// The normal lead coupling `ΓN`
    pub fn gamma_normal(&self) -> f64 {
        self.gamma_normal
    }

    /// The total superconducting coupling `Γ = ΓL + ΓR`
    pub fn total_coupling(&self) -> f64 {
        self.gamma_left + self.gamma_right
    }

    /// The phase difference `Φ` in radians
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// The local level `ε`
    pub fn level(&self) -> f64 {
        self.level
    }

    /// The shifted level `ed = ε - U/2`, whose Hartree shift at half filling is `U/2`
    pub fn shifted_level(&self) -> f64 {
        self.level - self.interaction / 2.
    }

    /// The Hartree-Fock level `ed + U n` at occupation `n`
    pub fn hartree_fock_level(&self, occupation: f64) -> f64 {
        self.shifted_level() + self.interaction * occupation
    }

    /// Whether the model is at the particle-hole symmetric point `ε = 0`
    pub fn is_half_filled(&self) -> bool {
        self.level == 0.
    }

    /// The signed phase coupling `γ(Φ)`, with `|γ| = |ΓR exp(iΦ/2) + ΓL exp(-iΦ/2)|`
    pub fn phase_coupling(&self) -> f64 {
        let (gr, gl) = (self.gamma_right, self.gamma_left);
        let magnitude = (gr * gr + gl * gl + 2. * gr * gl * self.phase.cos())
            .max(0.)
            .sqrt();
        let sign = (self.phase / 2.).cos();
        if sign < 0. {
            -magnitude
        } else {
            magnitude
        }
    }

    /// The derivative `dγ / dΦ`
    pub fn phase_coupling_derivative(&self) -> f64 {
        let (gr, gl) = (self.gamma_right, self.gamma_left);
        let coupling = self.phase_coupling();
        if coupling.abs() < PHASE_COUPLING_FLOOR {
            -(gr * gl).sqrt() * (self.phase / 2.).sin()
        } else {
            -gr * gl * self.phase.sin() / coupling
        }
    }
}

/// `K(ω) = 1 / sqrt(Δ² - (ω + i0)²)`, or `None` on the gap edge where it diverges
pub(crate) fn gap_kernel(gap: f64, omega: f64) -> Option<Complex64> {
    let difference = gap * gap - omega * omega;
    if difference.abs() <= GAP_EDGE_TOLERANCE * gap * gap {
        return None;
    }
    if difference > 0. {
        Some(Complex64::new(1. / difference.sqrt(), 0.))
    } else {
        Some(Complex64::new(0., omega.signum() / (-difference).sqrt()))
    }
}

/// The lead functions entering the dot Green's function at a single frequency
#[derive(Clone, Copy, Debug)]
pub(crate) struct Hybridisation {
    /// `ω (1 + s(ω))`
    pub(crate) renormalised_frequency: Complex64,
    /// The induced pairing `Δ_Φ(ω)`
    pub(crate) pairing: Complex64,
}

impl ModelParameters {
    /// Evaluate the lead functions at `omega`, `None` on the gap edge
    pub(crate) fn hybridisation(&self, omega: f64) -> Option<Hybridisation> {
        let kernel = gap_kernel(self.gap, omega)?;
        Some(Hybridisation {
            renormalised_frequency: omega * (1. + self.total_coupling() * kernel),
            pairing: self.gap * self.phase_coupling() * kernel,
        })
    }

    /// `∂Δ_Φ(ω) / ∂Φ`, entering the Josephson current
    pub(crate) fn pairing_phase_derivative(&self, omega: f64) -> Option<Complex64> {
        let kernel = gap_kernel(self.gap, omega)?;
        Some(self.gap * self.phase_coupling_derivative() * kernel)
    }
}

#[cfg(test)]
mod test {
    use super::{gap_kernel, ModelParameters};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn phase_coupling_matches_total_coupling_at_zero_phase() {
        let params = ModelParameters::from_reduced(1., 1., 0.3, 2., 0., 0.).unwrap();
        assert_relative_eq!(params.phase_coupling(), 0.9, epsilon = 1e-14);
        assert_relative_eq!(params.phase_coupling_derivative(), 0., epsilon = 1e-14);
    }

    #[test]
    fn phase_coupling_changes_sign_beyond_pi() {
        let before = ModelParameters::from_reduced(1., 1., 0.5, 1., 0., 0.8).unwrap();
        let after = ModelParameters::from_reduced(1., 1., 0.5, 1., 0., 1.2).unwrap();
        assert!(before.phase_coupling() > 0.);
        assert!(after.phase_coupling() < 0.);
        assert_relative_eq!(
            before.phase_coupling(),
            -after.phase_coupling(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn phase_coupling_derivative_matches_finite_difference() {
        let h = 1e-6;
        for phase in [0.3, 1.1, 2.5, 3.6, 5.0] {
            let at = |p: f64| ModelParameters::new(0.5, 1., 0.4, 0.7, 0.1, p).unwrap();
            let numerical =
                (at(phase + h).phase_coupling() - at(phase - h).phase_coupling()) / (2. * h);
            assert_relative_eq!(
                at(phase).phase_coupling_derivative(),
                numerical,
                epsilon = 1e-7
            );
        }
        // Symmetric coupling at Φ = π
        let symmetric = ModelParameters::new(0.5, 1., 0.5, 0.5, 0., PI).unwrap();
        assert!(symmetric.phase_coupling().abs() < 1e-12);
        assert_relative_eq!(symmetric.phase_coupling_derivative(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn gap_kernel_is_real_in_the_gap_and_imaginary_outside() {
        let inside = gap_kernel(1., 0.6).unwrap();
        assert_relative_eq!(inside.re, 1.25, epsilon = 1e-14);
        assert_eq!(inside.im, 0.);
        let outside = gap_kernel(1., -1.25).unwrap();
        assert_eq!(outside.re, 0.);
        assert_relative_eq!(outside.im, -1. / 0.75, epsilon = 1e-14);
        assert!(gap_kernel(1., 1.).is_none());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(ModelParameters::new(1., 0., 0.5, 0.5, 0., 0.).is_err());
        assert!(ModelParameters::new(-1., 1., 0.5, 0.5, 0., 0.).is_err());
        assert!(ModelParameters::new(1., 1., 0., 0.5, 0., 0.).is_err());
        assert!(ModelParameters::new(1., 1., 0.5, 0.5, f64::NAN, 0.).is_err());
    }
}
