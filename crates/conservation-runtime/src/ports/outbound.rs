//! # Outbound Ports
//!
//! Traits for the collaborators the runtime consumes: the checksum oracle
//! and the fingerprint function. Both are injected at construction time.

use crate::domain::{Fingerprint, CANONICAL_RESIDUE, CONSERVATION_MODULUS};

/// Checksum oracle - outbound port.
///
/// Maps a byte to one of `K` symbolic classes and reduces byte ranges to a
/// residue. Implementations must be pure so they can be shared across
/// extraction threads.
pub trait ChecksumOracle: Send + Sync {
    /// Class of a single byte, in `[0, K)`.
    fn classify(&self, byte: u8) -> u8;

    /// Residue of a byte range, in `[0, K)`.
    fn residue(&self, bytes: &[u8]) -> u8 {
        let k = u32::from(CONSERVATION_MODULUS);
        bytes
            .iter()
            .fold(0u32, |acc, &b| (acc + u32::from(self.classify(b))) % k) as u8
    }

    /// `residue(bytes) == 0`.
    fn sum_check(&self, bytes: &[u8]) -> bool {
        self.residue(bytes) == CANONICAL_RESIDUE
    }
}

/// Fingerprint function - outbound port.
///
/// Must be deterministic and order-sensitive over every byte.
pub trait FingerprintFunction: Send + Sync {
    /// Short algorithm name, used in logs.
    fn name(&self) -> &'static str;

    /// Fingerprint of `bytes`.
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint;
}
