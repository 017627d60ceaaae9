//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits: checksum oracle and fingerprint
//! functions.

mod fingerprint;
mod oracle;

pub use fingerprint::{Blake3Fingerprint, Keccak256Fingerprint, RunningReductionFingerprint};
pub use oracle::ModularOracle;
