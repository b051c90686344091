//! Scalar root finding
//!
//! Bracketed roots are found with Brent's method from `argmin`. Fixed points `x = F(x)` are found
//! either by applying Brent's method to `x - F(x)` or by Steffensen accelerated iteration, the choice
//! being made at runtime through the `RootFinder` trait.
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::brent::BrentRoot;
use miette::Diagnostic;
use serde::Deserialize;

/// A scalar map which may fail to evaluate
pub type ScalarMap<'a> = dyn Fn(f64) -> anyhow::Result<f64> + 'a;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of the scalar root finders
pub enum RootFindingError {
    #[error("the interval [{0}, {1}] does not bracket a root")]
    /// Bracketing methods need a sign change across the interval
    NotBracketed(f64, f64),
    #[error("reached the maximum of {0} root finding iterations")]
    /// The iteration cap was hit before reaching the tolerance
    MaximumIterations(u64),
    #[error(transparent)]
    /// The function could not be evaluated
    Evaluation(#[from] anyhow::Error),
}

struct Problem<'a> {
    function: &'a ScalarMap<'a>,
}

impl CostFunction for Problem<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        (self.function)(*p)
    }
}

/// Find a root of `function` in `[lower, upper]` with Brent's method
pub fn brent_root(
    function: &ScalarMap<'_>,
    [lower, upper]: [f64; 2],
    tolerance: f64,
    maximum_iterations: u64,
) -> Result<f64, RootFindingError> {
    let (f_lower, f_upper) = (function(lower)?, function(upper)?);
    if f_lower == 0. {
        return Ok(lower);
    }
    if f_upper == 0. {
        return Ok(upper);
    }
    if f_lower.signum() == f_upper.signum() || f_lower.is_nan() || f_upper.is_nan() {
        return Err(RootFindingError::NotBracketed(lower, upper));
    }

    let solver = BrentRoot::new(lower, upper, tolerance);
    let result = Executor::new(Problem { function }, solver)
        .configure(|state| state.param(0.5 * (lower + upper)).max_iters(maximum_iterations))
        .run()?;

    let state = result.state();
    if state.get_iter() >= maximum_iterations {
        return Err(RootFindingError::MaximumIterations(maximum_iterations));
    }
    state
        .get_best_param()
        .copied()
        .ok_or(RootFindingError::MaximumIterations(state.get_iter()))
}

/// A strategy for solving the scalar fixed point problem `x = F(x)`
pub trait RootFinder {
    /// Solve `x = map(x)`. Bracketing strategies search `bracket`, iterative strategies start from `initial`
    fn solve_fixed_point(
        &self,
        map: &ScalarMap<'_>,
        bracket: [f64; 2],
        initial: f64,
    ) -> Result<f64, RootFindingError>;
}

/// Brent's method applied to `x - F(x)`
#[derive(Clone, Copy, Debug)]
pub struct Brent {
    tolerance: f64,
    maximum_iterations: u64,
}

impl Brent {
    /// Create the strategy with an absolute tolerance on `x`
    pub fn new(tolerance: f64, maximum_iterations: u64) -> Self {
        Self {
            tolerance,
            maximum_iterations,
        }
    }
}

impl RootFinder for Brent {
    fn solve_fixed_point(
        &self,
        map: &ScalarMap<'_>,
        bracket: [f64; 2],
        _initial: f64,
    ) -> Result<f64, RootFindingError> {
        let residual = |x: f64| -> anyhow::Result<f64> { Ok(x - map(x)?) };
        brent_root(&residual, bracket, self.tolerance, self.maximum_iterations)
    }
}

/// Fixed point iteration with Steffensen's (Aitken's delta squared) acceleration
#[derive(Clone, Copy, Debug)]
pub struct Steffensen {
    tolerance: f64,
    maximum_iterations: u64,
}

impl Steffensen {
    /// Create the strategy with a relative tolerance on successive iterates
    pub fn new(tolerance: f64, maximum_iterations: u64) -> Self {
        Self {
            tolerance,
            maximum_iterations,
        }
    }
}

impl RootFinder for Steffensen {
    fn solve_fixed_point(
        &self,
        map: &ScalarMap<'_>,
        _bracket: [f64; 2],
        initial: f64,
    ) -> Result<f64, RootFindingError> {
        let mut current = initial;
        for _ in 0..self.maximum_iterations {
            let first = map(current)?;
            let second = map(first)?;
            let denominator = second - 2. * first + current;
            let next = if denominator != 0. {
                current - (first - current).powi(2) / denominator
            } else {
                second
            };
            let change = if current != 0. {
                ((next - current) / current).abs()
            } else {
                next.abs()
            };
            if change < self.tolerance {
                return Ok(next);
            }
            current = next;
        }
        Err(RootFindingError::MaximumIterations(self.maximum_iterations))
    }
}

/// The available fixed point strategies, selected in the configuration file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootFindingMethod {
    /// Brent's method on a bracket
    Brentq,
    /// Steffensen accelerated iteration
    FixedPoint,
}

impl Default for RootFindingMethod {
    fn default() -> Self {
        RootFindingMethod::Brentq
    }
}

impl RootFindingMethod {
    /// Construct the strategy
    pub fn strategy(&self, tolerance: f64, maximum_iterations: u64) -> Box<dyn RootFinder> {
        match self {
            RootFindingMethod::Brentq => Box::new(Brent::new(tolerance, maximum_iterations)),
            RootFindingMethod::FixedPoint => {
                Box::new(Steffensen::new(tolerance, maximum_iterations))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{brent_root, RootFinder, RootFindingError, RootFindingMethod, Steffensen};
    use approx::assert_relative_eq;

    const DOTTIE: f64 = 0.739_085_133_215_160_6;

    #[test]
    fn brent_finds_a_bracketed_root() {
        let root = brent_root(&|x: f64| Ok(x * x - 2.), [0., 2.], 1e-12, 100).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn brent_rejects_an_interval_without_sign_change() {
        let result = brent_root(&|x: f64| Ok(x * x + 1.), [-1., 2.], 1e-12, 100);
        assert!(matches!(result, Err(RootFindingError::NotBracketed(_, _))));
    }

    #[test]
    fn evaluation_errors_propagate() {
        let result = brent_root(
            &|_: f64| Err(anyhow::anyhow!("no bound state")),
            [0., 1.],
            1e-12,
            100,
        );
        assert!(matches!(result, Err(RootFindingError::Evaluation(_))));
    }

    #[test]
    fn strategies_agree_on_a_contraction() {
        for method in [RootFindingMethod::Brentq, RootFindingMethod::FixedPoint] {
            let strategy = method.strategy(1e-12, 100);
            let fixed_point = strategy
                .solve_fixed_point(&|x: f64| Ok(x.cos()), [0., 1.], 0.5)
                .unwrap();
            assert_relative_eq!(fixed_point, DOTTIE, epsilon = 1e-9);
        }
    }

    #[test]
    fn steffensen_reports_the_iteration_cap() {
        let strategy = Steffensen::new(1e-12, 20);
        let result = strategy.solve_fixed_point(&|x: f64| Ok(x + 1.), [0., 1.], 0.);
        assert!(matches!(
            result,
            Err(RootFindingError::MaximumIterations(20))
        ));
    }
}
