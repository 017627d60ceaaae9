//! # Algorithms
//!
//! Shard extraction, reconstruction and the spectral transform backing
//! frequency-domain projections.

pub mod extraction;
pub mod reconstruction;
pub mod spectral;

pub use extraction::{extract, extract_batch, extract_batch_with_threshold, BatchExtraction};
pub use reconstruction::{ReconstructionContext, ReconstructionReport, ReconstructionState};
pub use spectral::{forward_spectrum, inverse_spectrum, Complex};
