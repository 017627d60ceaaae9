//! # Conservation Runtime
//!
//! Conservation-verified domains and shard reconstruction.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Isolate a byte buffer under a budget-tracked handle
//! - Produce and check tamper-evident fingerprints over buffer contents
//! - Split a buffer into shards and reassemble them into a byte-identical,
//!   conserved whole
//!
//! A buffer is *conserved* when the sum of its bytes is `0 mod 96`.
//!
//! ## Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | Budget residue stays in `[0, 96)` | `ConservationDomain::budget_alloc` / `budget_release` |
//! | Attach and commit happen once | `DomainState::can_transition_to` |
//! | Shard payload never changes | `Shard` owns its bytes; `verify` re-hashes |
//! | Output order is Φ order | `ReconstructionContext::finalize` sorts by `start_phi` |
//!
//! ## Module Structure
//!
//! ```text
//! conservation-runtime/
//! ├── domain/          # Errors, invariants, Domain, Witness, Projection, Shard
//! ├── algorithms/      # Extraction, reconstruction, FFT
//! ├── ports/           # API trait + oracle/fingerprint traits
//! ├── adapters/        # Modular oracle, Keccak/BLAKE3/reduction fingerprints
//! ├── service/         # ConservationRuntime
//! ├── config.rs        # RuntimeConfig
//! ├── metrics.rs       # RuntimeMetrics
//! └── telemetry.rs     # tracing-subscriber setup
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-exports
pub use adapters::{Blake3Fingerprint, Keccak256Fingerprint, ModularOracle, RunningReductionFingerprint};
pub use algorithms::{
    extract, extract_batch, extract_batch_with_threshold, BatchExtraction, ReconstructionContext,
    ReconstructionReport, ReconstructionState,
};
pub use config::{
    ConservationPolicy, LogConfig, OverlapCheck, ReconstructionPolicy, RuntimeConfig,
    RuntimeConfigBuilder,
};
pub use domain::{
    invariant_budget_residue, invariant_conserved, residue_of, BoundaryRegion,
    ConservationDomain, ConservationError, DomainState, ErrorKind, Fingerprint, LinearMap,
    Projection, ProjectionKind, Result, Shard, Witness, CANONICAL_RESIDUE, CONSERVATION_MODULUS,
    DEFAULT_OVERLAP_WINDOW, FINGERPRINT_LEN, MAX_RECONSTRUCTION_BYTES, PAGE_SIZE,
};
pub use metrics::{MetricsSnapshot, RuntimeMetrics};
pub use ports::{ChecksumOracle, ConservationApi, FingerprintFunction};
pub use service::ConservationRuntime;
pub use telemetry::{init_tracing, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
