//! # Witness
//!
//! Immutable fingerprint of a byte range, produced once and checked many
//! times. A witness knows nothing about later mutations of the range it was
//! taken from; callers regenerate after mutating.

use super::errors::{ConservationError, Result};
use super::value_objects::Fingerprint;
use crate::adapters::Keccak256Fingerprint;
use crate::ports::outbound::FingerprintFunction;
use serde::{Deserialize, Serialize};

/// Tamper-evident fingerprint of a byte range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Witness {
    fingerprint: Fingerprint,
    data_length: usize,
}

impl Witness {
    /// Fingerprint `data` with Keccak-256.
    pub fn generate(data: &[u8]) -> Result<Self> {
        Self::generate_with(&Keccak256Fingerprint, data)
    }

    /// Fingerprint `data` with `function`.
    pub fn generate_with(function: &dyn FingerprintFunction, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(ConservationError::InvalidArgument(
                "cannot witness an empty buffer".to_string(),
            ));
        }
        Ok(Self {
            fingerprint: function.fingerprint(data),
            data_length: data.len(),
        })
    }

    /// Whether `data` still matches (Keccak-256).
    pub fn verify(&self, data: &[u8]) -> bool {
        self.verify_with(&Keccak256Fingerprint, data)
    }

    /// Whether `data` still matches under `function`.
    ///
    /// A length mismatch fails without hashing.
    pub fn verify_with(&self, function: &dyn FingerprintFunction, data: &[u8]) -> bool {
        data.len() == self.data_length && function.fingerprint(data) == self.fingerprint
    }

    /// Like [`verify_with`](Self::verify_with), reporting why it failed.
    pub fn check_with(&self, function: &dyn FingerprintFunction, data: &[u8]) -> Result<()> {
        if data.len() != self.data_length {
            return Err(ConservationError::WitnessMismatch(format!(
                "length {} != witnessed length {}",
                data.len(),
                self.data_length
            )));
        }
        let actual = function.fingerprint(data);
        if actual != self.fingerprint {
            return Err(ConservationError::WitnessMismatch(format!(
                "{} fingerprint {} != witnessed {}",
                function.name(),
                actual.to_hex(),
                self.fingerprint.to_hex()
            )));
        }
        Ok(())
    }

    /// Stored fingerprint.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Length of the witnessed range.
    pub fn data_length(&self) -> usize {
        self.data_length
    }
}
