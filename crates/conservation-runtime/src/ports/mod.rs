//! Ports Layer
//!
//! - Driving port (inbound): [`ConservationApi`]
//! - Driven ports (outbound): [`ChecksumOracle`], [`FingerprintFunction`]

pub mod inbound;
pub mod outbound;

pub use inbound::ConservationApi;
pub use outbound::{ChecksumOracle, FingerprintFunction};
