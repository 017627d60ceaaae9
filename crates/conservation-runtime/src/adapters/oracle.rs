//! Modular Oracle Adapter
//!
//! Implements `ChecksumOracle` as plain reduction mod K.

use crate::domain::{residue_of, CONSERVATION_MODULUS};
use crate::ports::outbound::ChecksumOracle;

/// `classify(b) = b mod K`; `residue(bytes) = sum(bytes) mod K`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModularOracle;

impl ChecksumOracle for ModularOracle {
    fn classify(&self, byte: u8) -> u8 {
        byte % CONSERVATION_MODULUS
    }

    fn residue(&self, bytes: &[u8]) -> u8 {
        residue_of(bytes)
    }
}
