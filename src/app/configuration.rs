use super::error::AppError;
use crate::{
    error::ConfigurationError,
    hartree_fock::HartreeFockSettings,
    outer_loop::Convergence,
    spectral::{EnergyGrid, EnergyGridBuilder, IntegrationRule, Parity, TailSettings, TailWindow},
    utilities::root_finding::RootFindingMethod,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::{env, path::Path, path::PathBuf};

/// Numerical settings of a calculation, layered from the configuration files and the environment
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// The energy grid
    pub grid: GridConfiguration,
    /// Asymptotic tail fitting
    pub tail: TailConfiguration,
    /// The mean-field stage
    pub hartree_fock: HartreeFockConfiguration,
    /// The density loop
    pub outer_loop: OuterLoopConfiguration,
    /// Files and console output
    pub output: OutputConfiguration,
}

/// The `[grid]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GridConfiguration {
    /// Spacing `dE`
    pub step: f64,
    /// The grid holds `2^exponent - 1` points
    pub exponent: u32,
    /// Quadrature used for the density integrals
    pub integration_rule: IntegrationRule,
}

impl Default for GridConfiguration {
    fn default() -> Self {
        Self {
            step: 0.005,
            exponent: 16,
            integration_rule: IntegrationRule::Trapezium,
        }
    }
}

impl GridConfiguration {
    /// Construct the energy grid
    pub fn build(&self) -> Result<EnergyGrid, ConfigurationError> {
        EnergyGridBuilder::new()
            .with_step(self.step)
            .with_exponent(self.exponent)
            .with_integration_rule(self.integration_rule)
            .build()
    }
}

/// The `[tail]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TailConfiguration {
    /// Whether tails of convolved functions are replaced by the asymptotic fit
    pub enabled: bool,
    /// Lower edge of the fitting window in `|ω|`
    pub fit_min: f64,
    /// Upper edge of the fitting window in `|ω|`
    pub fit_max: f64,
    /// Parity of the normal self-energy
    pub normal: Parity,
    /// Parity of the anomalous self-energy
    pub anomalous: Parity,
    /// Parity of the bubbles
    pub bubble: Parity,
}

impl Default for TailConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            fit_min: 20.,
            fit_max: 30.,
            normal: Parity::Odd,
            anomalous: Parity::Even,
            bubble: Parity::Even,
        }
    }
}

impl TailConfiguration {
    /// The validated tail settings, `None` when fitting is disabled
    pub fn settings(&self) -> Result<Option<TailSettings>, ConfigurationError> {
        if !self.enabled {
            return Ok(None);
        }
        Ok(Some(TailSettings {
            window: TailWindow::new(self.fit_min, self.fit_max)?,
            normal: self.normal,
            anomalous: self.anomalous,
            bubble: self.bubble,
        }))
    }
}

/// The `[hartree_fock]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HartreeFockConfiguration {
    /// Initial guess for the bound state energy
    pub initial_bound_state: f64,
    /// Convergence threshold
    pub tolerance: f64,
    /// Iteration cap
    pub maximum_iterations: usize,
    /// Linear mixing fraction
    pub mixing: f64,
}

impl Default for HartreeFockConfiguration {
    fn default() -> Self {
        let settings = HartreeFockSettings::default();
        Self {
            initial_bound_state: settings.initial_bound_state,
            tolerance: settings.tolerance,
            maximum_iterations: settings.maximum_iterations,
            mixing: settings.mixing,
        }
    }
}

impl HartreeFockConfiguration {
    /// The settings of the mean-field solver
    pub fn settings(&self) -> HartreeFockSettings {
        HartreeFockSettings {
            initial_bound_state: self.initial_bound_state,
            tolerance: self.tolerance,
            maximum_iterations: self.maximum_iterations,
            mixing: self.mixing,
        }
    }
}

/// The `[outer_loop]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OuterLoopConfiguration {
    /// Root finding strategy for the density functionals
    pub method: RootFindingMethod,
    /// Convergence threshold on the change in `n` and `μ`
    pub tolerance: f64,
    /// Tolerance of the scalar root finder
    pub root_tolerance: f64,
    /// Iteration cap of the density loop
    pub maximum_iterations: usize,
    /// Iteration cap of each scalar root search
    pub maximum_root_iterations: u64,
    /// Lower edge of the pairing bracket
    pub mu_min: f64,
    /// Upper edge of the pairing bracket
    pub mu_max: f64,
}

impl Default for OuterLoopConfiguration {
    fn default() -> Self {
        Self {
            method: RootFindingMethod::Brentq,
            tolerance: 1e-4,
            root_tolerance: 1e-8,
            maximum_iterations: 200,
            maximum_root_iterations: 200,
            mu_min: -0.5,
            mu_max: 0.5,
        }
    }
}

impl OuterLoopConfiguration {
    /// The validated convergence settings of the density loop
    pub fn convergence(&self) -> Result<Convergence, ConfigurationError> {
        Convergence::new(
            self.tolerance,
            self.root_tolerance,
            self.maximum_iterations,
            self.maximum_root_iterations,
            self.method,
            [self.mu_min, self.mu_max],
        )
    }
}

/// The `[output]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfiguration {
    /// Whether progress is logged to the console, otherwise only warnings are shown
    pub verbose: bool,
    /// Directory receiving the log and the data files
    pub directory: PathBuf,
    /// Write the mean-field Green's functions
    pub write_hartree_fock_greens: bool,
    /// Write the bubbles
    pub write_bubbles: bool,
    /// Write the second order self-energy
    pub write_self_energy: bool,
    /// Write the second order Green's functions
    pub write_second_order_greens: bool,
    /// Largest `|E|` written to the data files
    pub maximum_energy: f64,
    /// Spacing of the rows in the data files
    pub energy_step: f64,
}

impl Default for OutputConfiguration {
    fn default() -> Self {
        Self {
            verbose: true,
            directory: PathBuf::from("results"),
            write_hartree_fock_greens: false,
            write_bubbles: false,
            write_self_energy: false,
            write_second_order_greens: false,
            maximum_energy: 5.,
            energy_step: 0.01,
        }
    }
}

impl Configuration {
    /// Layer the default file, the run mode file, an optional user file and the environment
    pub fn build(file_path: Option<&Path>) -> Result<Self, AppError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // The default settings which we use in the general case
            .add_source(File::with_name(".config/default").required(false))
            // The override settings for the run mode, optional
            .add_source(File::with_name(&format!(".config/{}", run_mode)).required(false));
        if let Some(path) = file_path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("SQUAD").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
