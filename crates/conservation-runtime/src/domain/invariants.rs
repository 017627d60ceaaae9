//! # Domain Invariants
//!
//! Arithmetic rules that must always hold for domains, regions and
//! reconstructed buffers.

use super::errors::{ConservationError, Result};

/// Conservation modulus K. Budgets and checksums are residues in `[0, K)`.
pub const CONSERVATION_MODULUS: u8 = 96;

/// The residue a conserved buffer must reduce to.
pub const CANONICAL_RESIDUE: u8 = 0;

/// Bytes per page of the coordinate space.
pub const PAGE_SIZE: usize = 256;

/// Fingerprint width in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Hard upper bound on a reconstructed buffer (1 GiB).
pub const MAX_RECONSTRUCTION_BYTES: u64 = 1 << 30;

/// Overlap comparison window used by the bounded overlap check.
pub const DEFAULT_OVERLAP_WINDOW: usize = 64;

/// `sum(bytes) mod K`.
pub fn residue_of(bytes: &[u8]) -> u8 {
    let k = u64::from(CONSERVATION_MODULUS);
    let sum = bytes.chunks(1 << 20).fold(0u64, |acc, chunk| {
        let part: u64 = chunk.iter().map(|&b| u64::from(b)).sum();
        (acc + part) % k
    });
    sum as u8
}

/// Invariant: budget is a valid residue in `[0, K)`.
pub fn invariant_budget_residue(budget: u8) -> bool {
    budget < CONSERVATION_MODULUS
}

/// Invariant: buffer residue equals the canonical residue.
pub fn invariant_conserved(bytes: &[u8]) -> Result<()> {
    let residue = residue_of(bytes);
    if residue != CANONICAL_RESIDUE {
        return Err(ConservationError::ConservationViolation { residue });
    }
    Ok(())
}

/// Number of pages the half-open range `[start, end)` touches.
pub fn pages_touched(start: usize, end: usize) -> usize {
    if end <= start {
        return 0;
    }
    (end - 1) / PAGE_SIZE - start / PAGE_SIZE + 1
}

/// Invariant: `[start, end)` is a non-empty range inside `[0, extent)`.
pub fn invariant_region_within(start: usize, end: usize, extent: usize) -> Result<()> {
    if start > end {
        return Err(ConservationError::boundary(start, end, "start after end"));
    }
    if start == end {
        return Err(ConservationError::boundary(start, end, "empty region"));
    }
    if end > extent {
        return Err(ConservationError::boundary(
            start,
            end,
            format!("end beyond projection extent {}", extent),
        ));
    }
    Ok(())
}
