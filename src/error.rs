//! # Error
//! Errors raised by the solver library

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Invalid input parameters or numerical settings, raised before any calculation takes place
pub enum ConfigurationError {
    #[error("the grid exponent {0} is outside the supported range {1}..={2}")]
    /// The grid would be too small to resolve the gap or too large to allocate
    GridExponent(u32, u32, u32),
    #[error("the grid size overflowed for exponent {0}")]
    /// Checked arithmetic on the grid size failed
    GridOverflow(u32),
    #[error("the energy step must be positive and finite, found {0}")]
    /// A non-positive or non-finite energy step
    EnergyStep(f64),
    #[error("invalid tail window: fit_min = {0}, fit_max = {1}")]
    /// The fitting window for the asymptotic tails is empty or negative
    TailWindow(f64, f64),
    #[error("invalid model parameter: {0}")]
    /// A model parameter is out of range
    ModelParameter(String),
    #[error("the initial bound state guess {0} does not lie in the gap (0, {1})")]
    /// The Hartree-Fock bound state guess cannot seed the root search
    InitialBoundState(f64, f64),
    #[error("invalid pairing bracket: mu_min = {0}, mu_max = {1}")]
    /// The bracket for the pairing root search is empty
    PairingBracket(f64, f64),
    #[error("position {0} is outside a grid of {1} points")]
    /// A grid position was requested outside the grid
    GridPosition(usize, usize),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// The top level error of a calculation, naming the stage which failed
pub enum SolverError {
    #[error(transparent)]
    /// The inputs were rejected
    Configuration(#[from] ConfigurationError),
    #[error("the Hartree-Fock stage failed to converge")]
    /// The mean-field solution could not be found
    HartreeFock(#[from] crate::hartree_fock::HartreeFockError),
    #[error("failed to locate the Andreev bound state of the interacting Green's function")]
    /// The converged state has no in-gap bound state
    GreensFunction(#[from] crate::greens_functions::GreensFunctionError),
    #[error("the density consistency loop failed to converge")]
    /// The outer density loop failed
    DensityLoop(#[from] crate::outer_loop::OuterLoopError),
}

impl SolverError {
    /// A short name for the stage of the calculation that failed
    pub fn stage(&self) -> &'static str {
        match self {
            SolverError::Configuration(_) => "configuration",
            SolverError::HartreeFock(_) => "hartree-fock",
            SolverError::GreensFunction(_) => "greens-function",
            SolverError::DensityLoop(_) => "density-loop",
        }
    }
}
