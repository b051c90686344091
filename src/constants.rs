// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Constants
//!
//! Defines the numerical constants used in the simulation. Energies are in the units of the
//! command line parameters and `e = hbar = 1`.

pub(crate) const MIN_GRID_EXPONENT: u32 = 3; // Smallest grid holds 7 points
pub(crate) const MAX_GRID_EXPONENT: u32 = 24; // Largest grid holds 2^24 - 1 points
pub(crate) const GAP_EDGE_TOLERANCE: f64 = 1e-12; // Relative distance from the gap edge treated as on the edge
pub(crate) const GAP_EDGE_OFFSET: f64 = 1e-9; // Relative offset of the in-gap search interval from 0 and the gap edge
pub(crate) const PHASE_COUPLING_FLOOR: f64 = 1e-12; // Below this the phase coupling derivative takes its symmetric limit
pub(crate) const RESIDUE_MISMATCH_TOLERANCE: f64 = 1e-3; // Largest allowed difference of the normal residues at half filling
pub(crate) const BOUND_STATE_TOLERANCE: f64 = 1e-13; // Absolute tolerance on the Andreev bound state energy
pub(crate) const MAXIMUM_BOUND_STATE_ITERATIONS: u64 = 200; // Iteration cap of the bound state root search
