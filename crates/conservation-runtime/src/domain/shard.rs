//! # Shard
//!
//! Self-describing extract of a contiguous coordinate range. A shard owns a
//! private copy of its payload, which never changes after extraction.
//!
//! `start_phi`/`end_phi` place the shard in canonical (Φ) order; this is a
//! property of the coordinate space and is independent of extraction or
//! arrival order.
//!
//! A shard remembers the checksum oracle that sealed it, so `verify` agrees
//! with extraction whatever oracle the projection carried. The oracle is not
//! serialized; a deserialized shard verifies with the modular oracle unless
//! the receiver calls `verify_with`.

use super::errors::{ConservationError, Result};
use super::value_objects::{Fingerprint, ProjectionKind};
use crate::adapters::{Keccak256Fingerprint, ModularOracle};
use crate::ports::outbound::{ChecksumOracle, FingerprintFunction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

fn default_oracle() -> Arc<dyn ChecksumOracle> {
    Arc::new(ModularOracle)
}

/// Checksummed extract of a projection.
#[derive(Clone, Serialize, Deserialize)]
pub struct Shard {
    payload: Vec<u8>,
    start_phi: u64,
    end_phi: u64,
    checksum: u8,
    fingerprint: Fingerprint,
    region_class: u8,
    source_kind: ProjectionKind,
    #[serde(skip, default = "default_oracle")]
    oracle: Arc<dyn ChecksumOracle>,
}

impl Shard {
    /// Seal `payload` at `[start_phi, end_phi)`, computing its checksums.
    pub(crate) fn seal(
        payload: Vec<u8>,
        start_phi: u64,
        end_phi: u64,
        region_class: u8,
        source_kind: ProjectionKind,
        oracle: Arc<dyn ChecksumOracle>,
    ) -> Self {
        let checksum = oracle.residue(&payload);
        let fingerprint = Keccak256Fingerprint.fingerprint(&payload);
        Self {
            payload,
            start_phi,
            end_phi,
            checksum,
            fingerprint,
            region_class,
            source_kind,
            oracle,
        }
    }

    /// Recompute both checksums with the oracle that sealed the shard.
    pub fn verify(&self) -> bool {
        self.verify_with(self.oracle.as_ref())
    }

    /// Recompute both checksums, reducing through `oracle`.
    pub fn verify_with(&self, oracle: &dyn ChecksumOracle) -> bool {
        let span = self.end_phi.checked_sub(self.start_phi);
        span == Some(self.payload.len() as u64)
            && oracle.residue(&self.payload) == self.checksum
            && Keccak256Fingerprint.fingerprint(&self.payload) == self.fingerprint
    }

    /// Payload length.
    pub fn get_size(&self) -> usize {
        self.payload.len()
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    /// Copy the payload into `out`, truncating to `out.len()`.
    ///
    /// Returns the number of bytes written. An empty `out` is rejected.
    pub fn copy_data(&self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Err(ConservationError::InvalidArgument(
                "output buffer is empty".to_string(),
            ));
        }
        let n = out.len().min(self.payload.len());
        out[..n].copy_from_slice(&self.payload[..n]);
        Ok(n)
    }

    /// Canonical start (inclusive).
    pub fn start_phi(&self) -> u64 {
        self.start_phi
    }

    /// Canonical end (exclusive).
    pub fn end_phi(&self) -> u64 {
        self.end_phi
    }

    /// Residue of the payload recorded at extraction.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Keccak-256 fingerprint of the payload.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Class tag of the region it was cut from.
    pub fn region_class(&self) -> u8 {
        self.region_class
    }

    /// Kind of the source projection.
    pub fn source_kind(&self) -> ProjectionKind {
        self.source_kind
    }

    /// Overlapping canonical range with `other`, if any.
    pub fn overlap_with(&self, other: &Shard) -> Option<(u64, u64)> {
        let start = self.start_phi.max(other.start_phi);
        let end = self.end_phi.min(other.end_phi);
        (start < end).then_some((start, end))
    }

    /// Release the shard and its payload.
    pub fn destroy(self) {}
}

impl PartialEq for Shard {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
            && self.start_phi == other.start_phi
            && self.end_phi == other.end_phi
            && self.checksum == other.checksum
            && self.fingerprint == other.fingerprint
            && self.region_class == other.region_class
            && self.source_kind == other.source_kind
    }
}

impl Eq for Shard {}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("start_phi", &self.start_phi)
            .field("end_phi", &self.end_phi)
            .field("checksum", &self.checksum)
            .field("fingerprint", &self.fingerprint)
            .field("region_class", &self.region_class)
            .field("source_kind", &self.source_kind)
            .finish()
    }
}
