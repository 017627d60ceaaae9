//! # Inbound Ports
//!
//! API trait defining what the conservation runtime can do.

use crate::algorithms::{BatchExtraction, ReconstructionContext};
use crate::config::RuntimeConfig;
use crate::domain::{
    BoundaryRegion, ConservationDomain, Projection, ProjectionKind, Result, Shard, Witness,
};
use crate::metrics::MetricsSnapshot;

/// Conservation runtime API - inbound port.
///
/// Every operation is synchronous and completes in time proportional to
/// the buffer it touches.
pub trait ConservationApi: Send + Sync {
    /// Create an unattached domain of `size` bytes.
    fn create_domain<'buf>(&self, size: usize, initial_budget: u8)
        -> Result<ConservationDomain<'buf>>;

    /// Allocate `amount` from a domain's budget.
    fn budget_alloc(&self, domain: &ConservationDomain<'_>, amount: u8) -> Result<()>;

    /// Return `amount` to a domain's budget.
    fn budget_release(&self, domain: &ConservationDomain<'_>, amount: u8) -> Result<()>;

    /// Check the attached buffer against the conservation invariant.
    fn verify_domain(&self, domain: &ConservationDomain<'_>) -> Result<bool>;

    /// Fingerprint `data`.
    fn generate_witness(&self, data: &[u8]) -> Result<Witness>;

    /// Check `data` against a witness.
    fn verify_witness(&self, witness: &Witness, data: &[u8]) -> Result<()>;

    /// Create a projection over borrowed bytes.
    fn create_projection<'a>(&self, kind: ProjectionKind, source: &'a [u8])
        -> Result<Projection<'a>>;

    /// Extract one shard.
    fn extract(&self, projection: &Projection<'_>, region: &BoundaryRegion) -> Result<Shard>;

    /// Extract every region, reporting per-region outcomes.
    fn extract_batch(
        &self,
        projection: &Projection<'_>,
        regions: &[BoundaryRegion],
    ) -> BatchExtraction;

    /// Start a reconstruction expecting `total_expected` shards.
    fn begin_reconstruction(&self, total_expected: u32) -> Result<ReconstructionContext>;

    /// Get current configuration.
    fn config(&self) -> &RuntimeConfig;

    /// Get current metrics.
    fn metrics(&self) -> MetricsSnapshot;
}
