//! Sanity checks on the converged bound state
//!
//! Neither check aborts the calculation. At the particle-hole symmetric point the normal residues at
//! `±w0` must agree, and a change in sign of the anomalous residue between the Hartree-Fock and the
//! second order solution signals that the perturbation expansion has crossed the 0-π transition.
use crate::{constants::RESIDUE_MISMATCH_TOLERANCE, greens_functions::AndreevBoundState};

/// A non-fatal inconsistency in the converged solution
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConsistencyWarning {
    /// The anomalous residue at `-w0` changed sign between the two solutions
    AnomalousResidueSignFlip {
        /// Residue of the Hartree-Fock solution
        hartree_fock: f64,
        /// Residue of the second order solution
        interacting: f64,
    },
    /// The normal residues at `±w0` differ at half filling
    NormalResidueMismatch {
        /// Residue at `-w0`
        lower: f64,
        /// Residue at `+w0`
        upper: f64,
    },
}

impl std::fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsistencyWarning::AnomalousResidueSignFlip {
                hartree_fock,
                interacting,
            } => write!(
                f,
                concat!(
                    "the anomalous residue changed sign from {} (Hartree-Fock) to {}, ",
                    "the second order result is unreliable"
                ),
                hartree_fock, interacting
            ),
            ConsistencyWarning::NormalResidueMismatch { lower, upper } => write!(
                f,
                "the normal residues {} and {} differ at half filling",
                lower, upper
            ),
        }
    }
}

/// Compare the Hartree-Fock and second order bound states
pub fn check_consistency(
    hartree_fock: &AndreevBoundState,
    interacting: &AndreevBoundState,
    half_filled: bool,
) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();

    let hf_anomalous = hartree_fock.lower().residues().anomalous;
    let anomalous = interacting.lower().residues().anomalous;
    if hf_anomalous * anomalous < 0. {
        warnings.push(ConsistencyWarning::AnomalousResidueSignFlip {
            hartree_fock: hf_anomalous,
            interacting: anomalous,
        });
    }

    if half_filled {
        let lower = interacting.lower().residues().normal;
        let upper = interacting.upper().residues().normal;
        if (lower - upper).abs() > RESIDUE_MISMATCH_TOLERANCE {
            warnings.push(ConsistencyWarning::NormalResidueMismatch { lower, upper });
        }
    }

    for warning in warnings.iter() {
        tracing::warn!("{}", warning);
    }
    warnings
}
