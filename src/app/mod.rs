//! This module governs the high-level implementation of the application
mod calculations;
mod configuration;
mod error;
mod output;
mod telemetry;

pub use calculations::{second_order_calculation, Calculation};
pub use configuration::{
    Configuration, GridConfiguration, HartreeFockConfiguration, OuterLoopConfiguration,
    OutputConfiguration, TailConfiguration,
};
pub use error::AppError;

use crate::hamiltonian::ModelParameters;
use clap::{ArgEnum, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, allow_negative_numbers = true)]
struct App {
    /// Coulomb interaction U
    interaction: f64,
    /// Superconducting gap Delta
    gap: f64,
    /// Coupling to the right lead GammaR
    gamma_right: f64,
    /// Ratio of the couplings GammaL / GammaR
    gamma_ratio: f64,
    /// Local energy level eps, zero at half filling
    level: f64,
    /// Phase difference between the leads in units of pi
    phase_over_pi: f64,
    /// An additional configuration file overriding `.config/default.toml`
    #[clap(short, long)]
    config: Option<PathBuf>,
    #[clap(arg_enum, short, long, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", level)
    }
}

/// Parse the command line, run the calculation and print the summary
pub fn run() -> color_eyre::Result<()> {
    let cli = App::parse();

    let configuration = Configuration::build(cli.config.as_deref())?;
    std::fs::create_dir_all(&configuration.output.directory).map_err(AppError::from)?;
    let (subscriber, _guard) = telemetry::get_subscriber(
        cli.log_level,
        &configuration.output.directory,
        configuration.output.verbose,
    );
    telemetry::init_subscriber(subscriber)?;

    let parameters = ModelParameters::from_reduced(
        cli.interaction,
        cli.gap,
        cli.gamma_right,
        cli.gamma_ratio,
        cli.level,
        cli.phase_over_pi,
    )
    .map_err(|e| AppError::from(crate::error::SolverError::from(e)))?;
    tracing::info!(
        "U = {}, Delta = {}, GammaR = {}, GammaL = {}, eps = {}, Phi/pi = {}",
        parameters.interaction(),
        parameters.gap(),
        parameters.gamma_right(),
        parameters.gamma_left(),
        parameters.level(),
        cli.phase_over_pi
    );

    let calculation =
        second_order_calculation(&parameters, &configuration).map_err(AppError::from)?;
    output::write_data_files(&calculation, &configuration.output).map_err(AppError::from)?;

    println!("{}", output::summary_header());
    println!("{}", output::summary_line(&calculation));
    Ok(())
}
