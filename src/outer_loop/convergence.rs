use crate::{error::ConfigurationError, utilities::root_finding::RootFindingMethod};

/// Tolerances, iteration caps and the root finding strategy of the density loop
#[derive(Clone, Copy, Debug)]
pub struct Convergence {
    tolerance: f64,
    root_tolerance: f64,
    maximum_iterations: usize,
    maximum_root_iterations: u64,
    method: RootFindingMethod,
    pairing_bracket: [f64; 2],
}

impl Convergence {
    /// Create the settings, failing if the pairing bracket is empty
    pub fn new(
        tolerance: f64,
        root_tolerance: f64,
        maximum_iterations: usize,
        maximum_root_iterations: u64,
        method: RootFindingMethod,
        pairing_bracket: [f64; 2],
    ) -> Result<Self, ConfigurationError> {
        let [mu_min, mu_max] = pairing_bracket;
        if !(mu_min.is_finite() && mu_max.is_finite()) || mu_min >= mu_max {
            return Err(ConfigurationError::PairingBracket(mu_min, mu_max));
        }
        Ok(Self {
            tolerance,
            root_tolerance,
            maximum_iterations,
            maximum_root_iterations,
            method,
            pairing_bracket,
        })
    }

    pub(crate) fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub(crate) fn root_tolerance(&self) -> f64 {
        self.root_tolerance
    }

    pub(crate) fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    pub(crate) fn maximum_root_iterations(&self) -> u64 {
        self.maximum_root_iterations
    }

    pub(crate) fn method(&self) -> RootFindingMethod {
        self.method
    }

    pub(crate) fn pairing_bracket(&self) -> [f64; 2] {
        self.pairing_bracket
    }
}

impl Default for Convergence {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            root_tolerance: 1e-8,
            maximum_iterations: 200,
            maximum_root_iterations: 200,
            method: RootFindingMethod::Brentq,
            pairing_bracket: [-0.5, 0.5],
        }
    }
}

#[cfg(test)]
mod test {
    use super::Convergence;
    use crate::utilities::root_finding::RootFindingMethod;

    #[test]
    fn empty_pairing_brackets_are_rejected() {
        let with_bracket = |method, bracket| Convergence::new(1e-4, 1e-8, 10, 10, method, bracket);
        assert!(with_bracket(RootFindingMethod::Brentq, [0.5, -0.5]).is_err());
        assert!(with_bracket(RootFindingMethod::Brentq, [0., f64::NAN]).is_err());
        assert!(with_bracket(RootFindingMethod::FixedPoint, [-0.5, 0.5]).is_ok());
    }
}
