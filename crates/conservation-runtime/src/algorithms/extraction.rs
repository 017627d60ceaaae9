//! # Shard Extraction
//!
//! Cuts shards out of a projection along boundary regions.
//!
//! Extraction reads the projection and nothing else, and every helper it
//! calls is a pure function, so disjoint (or even overlapping) regions can
//! be extracted in parallel. The borrow checker keeps transforms out while
//! a batch holds `&Projection`.

use crate::domain::{
    BoundaryRegion, ConservationError, Projection, Result, Shard, CANONICAL_RESIDUE,
};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Batch size at which extraction fans out over rayon by default.
pub const PARALLEL_THRESHOLD: usize = 4;

/// Outcome of a batch extraction. One slot per requested region.
#[derive(Debug)]
pub struct BatchExtraction {
    /// Per-region result, in request order.
    pub results: Vec<Result<Shard>>,
}

impl BatchExtraction {
    /// Number of regions that produced a shard.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Number of regions that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Indices of failed regions.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.is_err().then_some(i))
            .collect()
    }

    /// Shards by slot; `None` where extraction failed.
    pub fn into_slots(self) -> Vec<Option<Shard>> {
        self.results.into_iter().map(Result::ok).collect()
    }

    /// Successful shards only, in request order.
    pub fn into_shards(self) -> Vec<Shard> {
        self.results.into_iter().filter_map(Result::ok).collect()
    }
}

/// Extract one shard.
///
/// Fails with `BoundaryInvalid` for malformed regions, and with
/// `ConservationViolation` when the region asserts `is_conserved` but its
/// payload does not reduce to the canonical residue.
///
/// Only the projection's structure is checked here. Its source bytes cannot
/// change behind a shared borrow, so the whole-buffer residue is not
/// recomputed per shard; a single cut costs O(region length).
/// [`extract_batch`] runs the full residue check once per batch.
pub fn extract(projection: &Projection<'_>, region: &BoundaryRegion) -> Result<Shard> {
    projection.ensure_structure()?;
    extract_unchecked(projection, region)
}

fn extract_unchecked(projection: &Projection<'_>, region: &BoundaryRegion) -> Result<Shard> {
    region.validate(projection.len())?;

    let bytes = &projection.data()[region.start_coord..region.end_coord];
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(bytes.len())
        .map_err(|_| ConservationError::OutOfMemory {
            requested: bytes.len(),
        })?;
    payload.extend_from_slice(bytes);

    let shard = Shard::seal(
        payload,
        region.start_coord as u64,
        region.end_coord as u64,
        region.region_class,
        projection.kind(),
        projection.oracle().clone(),
    );

    if region.is_conserved && shard.checksum() != CANONICAL_RESIDUE {
        return Err(ConservationError::ConservationViolation {
            residue: shard.checksum(),
        });
    }

    debug!(
        start = region.start_coord,
        end = region.end_coord,
        checksum = shard.checksum(),
        "[conservation] Shard extracted"
    );
    Ok(shard)
}

/// Extract every region independently with the default parallel threshold.
pub fn extract_batch(projection: &Projection<'_>, regions: &[BoundaryRegion]) -> BatchExtraction {
    extract_batch_with_threshold(projection, regions, PARALLEL_THRESHOLD)
}

/// Extract every region independently.
///
/// A failing region does not stop the others. Batches of at least
/// `parallel_threshold` regions run on the rayon pool.
pub fn extract_batch_with_threshold(
    projection: &Projection<'_>,
    regions: &[BoundaryRegion],
    parallel_threshold: usize,
) -> BatchExtraction {
    if let Err(e) = projection.ensure_valid() {
        warn!(error = %e, "[conservation] Batch extraction on invalid projection");
        return BatchExtraction {
            results: regions.iter().map(|_| Err(e.clone())).collect(),
        };
    }

    let results: Vec<Result<Shard>> = if regions.len() < parallel_threshold.max(1) {
        regions
            .iter()
            .map(|region| extract_unchecked(projection, region))
            .collect()
    } else {
        regions
            .par_iter()
            .map(|region| extract_unchecked(projection, region))
            .collect()
    };

    let batch = BatchExtraction { results };
    if batch.failed() > 0 {
        warn!(
            requested = regions.len(),
            succeeded = batch.succeeded(),
            "[conservation] Partial batch extraction"
        );
    }
    batch
}
