// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Error
//! The error type for the binary

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of the application shell
pub enum AppError {
    #[error(transparent)]
    #[diagnostic(code(squad::io_error))]
    /// Reading or writing a file failed
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    #[diagnostic(code(squad::config_error))]
    /// The configuration could not be read
    ConfigError(#[from] config::ConfigError),
    #[error("failed to initialise logging: {0}")]
    /// The global subscriber could not be installed
    Telemetry(String),
    #[error("calculation failed in the {} stage", .0.stage())]
    /// The calculation failed
    Solver(#[from] crate::error::SolverError),
}
