//! # Domain Errors
//!
//! Error taxonomy for the conservation runtime. Every fallible operation
//! returns one of these to its immediate caller; nothing escalates to a
//! process abort.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, ConservationError>;

/// Conservation runtime errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConservationError {
    /// Malformed input (caller bug).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure.
    #[error("Out of memory: could not reserve {requested} bytes")]
    OutOfMemory {
        /// Bytes requested
        requested: usize,
    },

    /// Not enough budget for an allocation.
    #[error("Budget exceeded: requested {requested}, available {available}")]
    BudgetExceeded {
        /// Amount requested
        requested: u8,
        /// Budget left on the domain
        available: u8,
    },

    /// Illegal state transition.
    #[error("State violation: {0}")]
    StateViolation(String),

    /// Buffer residue is not the canonical residue.
    #[error("Conservation violation: residue {residue} (expected 0)")]
    ConservationViolation {
        /// Observed residue mod K
        residue: u8,
    },

    /// Fingerprint mismatch.
    #[error("Witness mismatch: {0}")]
    WitnessMismatch(String),

    /// Malformed boundary region.
    #[error("Invalid boundary region [{start}, {end}): {reason}")]
    BoundaryInvalid {
        /// Region start coordinate
        start: usize,
        /// Region end coordinate
        end: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Incomplete or corrupt reconstruction.
    #[error("Reconstruction failed: {0}")]
    ReconstructionFailed(String),

    /// Projection failed its structural check.
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// A transform could not be applied.
    #[error("Transform failed: {0}")]
    TransformFailed(String),
}

/// Flat error kind, for callers that only care about the taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`ConservationError::InvalidArgument`].
    InvalidArgument,
    /// See [`ConservationError::OutOfMemory`].
    OutOfMemory,
    /// See [`ConservationError::BudgetExceeded`].
    BudgetExceeded,
    /// See [`ConservationError::StateViolation`].
    StateViolation,
    /// See [`ConservationError::ConservationViolation`].
    ConservationViolation,
    /// See [`ConservationError::WitnessMismatch`].
    WitnessMismatch,
    /// See [`ConservationError::BoundaryInvalid`].
    BoundaryInvalid,
    /// See [`ConservationError::ReconstructionFailed`].
    ReconstructionFailed,
    /// See [`ConservationError::InvalidProjection`].
    InvalidProjection,
    /// See [`ConservationError::TransformFailed`].
    TransformFailed,
}

impl ConservationError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::BudgetExceeded { .. } => ErrorKind::BudgetExceeded,
            Self::StateViolation(_) => ErrorKind::StateViolation,
            Self::ConservationViolation { .. } => ErrorKind::ConservationViolation,
            Self::WitnessMismatch(_) => ErrorKind::WitnessMismatch,
            Self::BoundaryInvalid { .. } => ErrorKind::BoundaryInvalid,
            Self::ReconstructionFailed(_) => ErrorKind::ReconstructionFailed,
            Self::InvalidProjection(_) => ErrorKind::InvalidProjection,
            Self::TransformFailed(_) => ErrorKind::TransformFailed,
        }
    }

    /// Whether the failing call left its handle as it was, so the caller can
    /// fix the input and continue with the same handle.
    ///
    /// `ReconstructionFailed` and `ConservationViolation` can end a
    /// reconstruction context; check its state before reusing it.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::ReconstructionFailed(_) | Self::ConservationViolation { .. }
        )
    }

    pub(crate) fn boundary(start: usize, end: usize, reason: impl Into<String>) -> Self {
        Self::BoundaryInvalid {
            start,
            end,
            reason: reason.into(),
        }
    }
}
