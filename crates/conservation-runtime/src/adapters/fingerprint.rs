//! Fingerprint Adapters
//!
//! Implements `FingerprintFunction` with Keccak-256 (default), BLAKE3 and a
//! cheap running reduction.

use crate::domain::{Fingerprint, FINGERPRINT_LEN};
use crate::ports::outbound::FingerprintFunction;
use sha3::{Digest, Keccak256};

/// Keccak-256 over the length prefix and the bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256Fingerprint;

impl FingerprintFunction for Keccak256Fingerprint {
    fn name(&self) -> &'static str {
        "keccak256"
    }

    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let mut hasher = Keccak256::new();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
        let result = hasher.finalize();
        let mut output = [0u8; FINGERPRINT_LEN];
        output.copy_from_slice(&result);
        Fingerprint(output)
    }
}

/// BLAKE3 over the length prefix and the bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Fingerprint;

impl FingerprintFunction for Blake3Fingerprint {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
        Fingerprint(*hasher.finalize().as_bytes())
    }
}

/// Non-cryptographic running reduction.
///
/// Byte `i` is XORed into lane `i mod 32` and a position-salted rotation of
/// it is added into the next lane. Every later operation on a lane is a
/// bijection of that lane, so any single-byte change alters the lane it was
/// XORed into: single-byte flips are always detected.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunningReductionFingerprint;

impl FingerprintFunction for RunningReductionFingerprint {
    fn name(&self) -> &'static str {
        "running-reduction"
    }

    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let mut lanes = [0u8; FINGERPRINT_LEN];
        for (i, &b) in bytes.iter().enumerate() {
            let lane = i % FINGERPRINT_LEN;
            let next = (lane + 1) % FINGERPRINT_LEN;
            lanes[lane] ^= b;
            let salted = b.rotate_left((i % 8) as u32) ^ (i as u8);
            lanes[next] = lanes[next].wrapping_add(salted);
        }
        for (lane, len_byte) in lanes.iter_mut().zip((bytes.len() as u64).to_le_bytes()) {
            *lane = lane.wrapping_add(len_byte);
        }
        Fingerprint(lanes)
    }
}
