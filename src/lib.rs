// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Squad is a self-consistent second-order perturbation theory solver for a superconducting quantum dot
//!
//! # Overview
//! Squad calculates the single-particle Nambu Green's functions of a single correlated level coupled to two
//! BCS superconducting leads at zero temperature. The mean-field (Hartree-Fock) solution is dressed with the
//! second-order dynamical self-energy, which is evaluated spectrally on a uniform real-frequency grid through
//! convolutions of the particle-hole and anomalous bubbles followed by a Kramers-Kronig transform.
//!
//! As the static part of the self-energy depends on the electron density `n` and the induced pairing `μ`, the
//! interacting Green's function is found by iterating the density functionals to a self-consistent fixed point
//! with the dynamical part held fixed. The converged Green's function then yields the Andreev bound state energy,
//! the residues of its poles and the Josephson current.
//!
//! # Usage
//! Squad is distributed as a binary crate taking the model parameters on the command line:
//!
//! ```text
//! squad U Delta GammaR GammaL/GammaR eps Phi/pi
//! ```
//!
//! Numerical settings are read from `.config/default.toml`:
//!
//! ```toml
//! [grid]
//! step = 0.005
//! exponent = 16
//!
//! [outer_loop]
//! method = "brentq"
//! tolerance = 1e-4
//! ```
//!
//! A single summary line is written to stdout when the calculation converges.

#![warn(missing_docs)]

/// The command line global application, tracing and output primitives
pub mod app;

/// Numerical constants
mod constants;

/// Error handling
pub mod error;

/// Nambu Green's functions of the dot and the location of their in-gap poles
pub mod greens_functions;

/// Model parameters and the lead hybridisation functions
pub mod hamiltonian;

/// The mean-field solution
pub mod hartree_fock;

/// Self-consistency of the static part of the self-energy
pub mod outer_loop;

/// Observables calculated from the converged Green's functions
pub mod postprocessor;

/// Second-order dynamical self-energies
pub mod self_energy;

/// Energy grid, spectral transforms and tail fitting
pub mod spectral;

/// Root finding
pub mod utilities;

pub use app::{second_order_calculation, Calculation, Configuration};
pub use error::{ConfigurationError, SolverError};
pub use hamiltonian::ModelParameters;
