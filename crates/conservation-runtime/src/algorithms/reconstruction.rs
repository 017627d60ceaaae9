//! # Reconstruction
//!
//! Accumulates shards in any arrival order and reassembles them in
//! canonical (Φ) order into a new projection.
//!
//! ## State machine
//!
//! ```text
//! init(n) ──► Accumulating ──(n shards)──► Complete ──finalize──► Finalized
//!                  │                           │
//!                  └──── overflow / bound ─────┴──── corrupt ───► Failed
//! ```
//!
//! `Failed` is terminal: the context must be discarded. Finalize runs once;
//! any later call is a `StateViolation`.

use crate::adapters::ModularOracle;
use crate::config::{ConservationPolicy, ReconstructionPolicy};
use crate::domain::{
    ConservationError, Projection, ProjectionKind, Result, Shard, CANONICAL_RESIDUE,
    CONSERVATION_MODULUS,
};
use crate::metrics::RuntimeMetrics;
use crate::ports::outbound::ChecksumOracle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Reconstruction lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconstructionState {
    /// Waiting for shards.
    Accumulating,
    /// All expected shards added.
    Complete,
    /// Finalize produced a projection.
    Finalized,
    /// Poisoned; discard the context.
    Failed,
}

/// Summary of a finalized reconstruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionReport {
    /// Context id
    pub context_id: Uuid,
    /// Shards consumed
    pub shard_count: u32,
    /// Length of the reconstructed buffer
    pub bytes: u64,
    /// Φ coordinate of the first output byte
    pub base_phi: u64,
    /// Overlapping shard pairs that were byte-compared
    pub overlap_pairs_checked: u32,
    /// Overlapping pairs whose compared bytes differed
    pub overlap_mismatches: u32,
    /// Residue of the output mod K
    pub residue: u8,
    /// Whether the output reduces to the canonical residue
    pub conserved: bool,
    /// Fold of the shard checksums accumulated on add
    pub cumulative_residue: u8,
}

/// Single-use shard accumulator.
pub struct ReconstructionContext {
    id: Uuid,
    total_expected: u32,
    shards: Vec<Shard>,
    total_bytes: u64,
    cumulative_residue: u8,
    state: ReconstructionState,
    policy: ReconstructionPolicy,
    oracle: Arc<dyn ChecksumOracle>,
    metrics: Arc<RuntimeMetrics>,
    report: Option<ReconstructionReport>,
}

impl ReconstructionContext {
    /// Context expecting `total_expected` shards, under the default policy.
    pub fn init(total_expected: u32) -> Result<Self> {
        Self::with_policy(
            total_expected,
            ReconstructionPolicy::default(),
            Arc::new(ModularOracle),
            Arc::new(RuntimeMetrics::new()),
        )
    }

    /// Context with an explicit policy, oracle and metrics sink.
    pub fn with_policy(
        total_expected: u32,
        policy: ReconstructionPolicy,
        oracle: Arc<dyn ChecksumOracle>,
        metrics: Arc<RuntimeMetrics>,
    ) -> Result<Self> {
        if total_expected == 0 {
            return Err(ConservationError::InvalidArgument(
                "total_expected must be at least 1".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        debug!(%id, total_expected, "[conservation] Reconstruction started");

        Ok(Self {
            id,
            total_expected,
            shards: Vec::new(),
            total_bytes: 0,
            cumulative_residue: 0,
            state: ReconstructionState::Accumulating,
            policy,
            oracle,
            metrics,
            report: None,
        })
    }

    /// Add a shard. Arrival order is irrelevant.
    pub fn add_shard(&mut self, shard: Shard) -> Result<()> {
        match self.state {
            ReconstructionState::Accumulating => {}
            ReconstructionState::Complete => {
                return Err(ConservationError::StateViolation(format!(
                    "context already holds all {} shards",
                    self.total_expected
                )))
            }
            state => {
                return Err(ConservationError::StateViolation(format!(
                    "cannot add shards to a {:?} context",
                    state
                )))
            }
        }

        if !shard.verify_with(self.oracle.as_ref()) {
            return Err(ConservationError::InvalidArgument(format!(
                "shard [{}, {}) failed verification",
                shard.start_phi(),
                shard.end_phi()
            )));
        }

        // Overlapping shards may legitimately sum past the bound; the output
        // span is checked against it in `finalize`.
        let total = match self.total_bytes.checked_add(shard.get_size() as u64) {
            Some(total) => total,
            None => return Err(self.poison("accumulated size overflowed".to_string())),
        };

        self.total_bytes = total;
        self.cumulative_residue = ((self.cumulative_residue as u16 + shard.checksum() as u16)
            % CONSERVATION_MODULUS as u16) as u8;
        self.shards.push(shard);

        if self.added_count() == self.total_expected {
            self.state = ReconstructionState::Complete;
            debug!(id = %self.id, bytes = self.total_bytes, "[conservation] Reconstruction complete");
        }
        Ok(())
    }

    /// True once every expected shard has been added.
    pub fn is_complete(&self) -> bool {
        self.state == ReconstructionState::Complete
    }

    /// Shards added so far.
    pub fn added_count(&self) -> u32 {
        self.shards.len() as u32
    }

    /// Shards this context was created for.
    pub fn total_expected(&self) -> u32 {
        self.total_expected
    }

    /// Current state.
    pub fn state(&self) -> ReconstructionState {
        self.state
    }

    /// Context id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Report of the last finalize, if it ran to the end.
    pub fn report(&self) -> Option<&ReconstructionReport> {
        self.report.as_ref()
    }

    /// Reassemble the shards into a projection of `target_kind`.
    ///
    /// Calling before completion fails with `ReconstructionFailed` and
    /// leaves the context usable. Every other outcome ends the context.
    pub fn finalize(&mut self, target_kind: ProjectionKind) -> Result<Projection<'static>> {
        match self.state {
            ReconstructionState::Complete => {}
            ReconstructionState::Accumulating => {
                return Err(ConservationError::ReconstructionFailed(format!(
                    "only {} of {} shards added",
                    self.added_count(),
                    self.total_expected
                )))
            }
            state => {
                return Err(ConservationError::StateViolation(format!(
                    "cannot finalize a {:?} context",
                    state
                )))
            }
        }

        let corrupt = self
            .shards
            .iter()
            .find(|s| !s.verify_with(self.oracle.as_ref()))
            .map(|s| (s.start_phi(), s.end_phi()));
        if let Some((start, end)) = corrupt {
            return Err(self.poison(format!(
                "shard [{}, {}) failed re-verification",
                start, end
            )));
        }

        let shards = std::mem::take(&mut self.shards);
        let assembled = match self.assemble(&shards) {
            Ok(assembled) => assembled,
            Err(e) => {
                self.shards = shards;
                self.state = ReconstructionState::Failed;
                self.metrics.record_reconstruction_failed();
                error!(id = %self.id, error = %e, "[conservation] Reconstruction failed");
                return Err(e);
            }
        };
        self.shards = shards;

        let Assembled {
            output,
            base_phi,
            pairs_checked,
            mismatches,
        } = assembled;

        let residue = self.oracle.residue(&output);
        let conserved = residue == CANONICAL_RESIDUE;
        if !conserved {
            match self.policy.conservation {
                ConservationPolicy::Strict => {
                    self.state = ReconstructionState::Failed;
                    self.metrics.record_reconstruction_failed();
                    self.metrics.record_conservation_violation();
                    error!(id = %self.id, residue, "[conservation] Reconstructed buffer not conserved");
                    return Err(ConservationError::ConservationViolation { residue });
                }
                ConservationPolicy::Warn => {
                    warn!(id = %self.id, residue, "[conservation] Reconstructed buffer not conserved");
                }
            }
        }

        let report = ReconstructionReport {
            context_id: self.id,
            shard_count: self.added_count(),
            bytes: output.len() as u64,
            base_phi,
            overlap_pairs_checked: pairs_checked,
            overlap_mismatches: mismatches,
            residue,
            conserved,
            cumulative_residue: self.cumulative_residue,
        };

        let projection = match Projection::with_oracle(target_kind, output, self.oracle.clone()) {
            Ok(p) => p,
            Err(e) => {
                self.state = ReconstructionState::Failed;
                self.metrics.record_reconstruction_failed();
                return Err(e);
            }
        };

        self.metrics
            .record_reconstruction_finalized(mismatches as usize, conserved);
        debug!(
            id = %self.id,
            bytes = report.bytes,
            overlaps = pairs_checked,
            mismatches,
            "[conservation] Reconstruction finalized"
        );

        self.report = Some(report);
        self.state = ReconstructionState::Finalized;
        Ok(projection)
    }

    /// Release the context and any shards it still holds.
    pub fn destroy(self) {
        debug!(id = %self.id, state = ?self.state, "[conservation] Reconstruction destroyed");
    }

    fn poison(&mut self, reason: String) -> ConservationError {
        self.state = ReconstructionState::Failed;
        self.metrics.record_reconstruction_failed();
        error!(id = %self.id, %reason, "[conservation] Reconstruction poisoned");
        ConservationError::ReconstructionFailed(reason)
    }

    fn assemble(&self, shards: &[Shard]) -> Result<Assembled> {
        let mut order: Vec<&Shard> = shards.iter().collect();
        order.sort_by_key(|s| (s.start_phi(), s.end_phi()));

        let (first, last_end) = match (order.first(), order.iter().map(|s| s.end_phi()).max()) {
            (Some(first), Some(end)) => (first, end),
            _ => {
                return Err(ConservationError::ReconstructionFailed(
                    "no shards to assemble".to_string(),
                ))
            }
        };
        let base = first.start_phi();

        let span = last_end - base;
        if span > self.policy.max_bytes {
            return Err(ConservationError::ReconstructionFailed(format!(
                "output of {} bytes exceeds bound of {}",
                span, self.policy.max_bytes
            )));
        }
        let span = usize::try_from(span).map_err(|_| {
            ConservationError::ReconstructionFailed(format!("output of {} bytes not addressable", span))
        })?;

        let mut output = Vec::new();
        output
            .try_reserve_exact(span)
            .map_err(|_| ConservationError::OutOfMemory { requested: span })?;

        let mut cursor = base;
        let mut pairs_checked = 0u32;
        let mut mismatches = 0u32;

        for shard in order {
            let (start, end) = (shard.start_phi(), shard.end_phi());
            if start > cursor {
                return Err(ConservationError::ReconstructionFailed(format!(
                    "gap between {} and {}",
                    cursor, start
                )));
            }

            let overlap = (cursor.min(end) - start) as usize;
            if overlap > 0 {
                pairs_checked += 1;
                let compare = self.policy.overlap_check.compare_len(overlap);
                let offset = (start - base) as usize;
                if output[offset..offset + compare] != shard.data()[..compare] {
                    mismatches += 1;
                    warn!(
                        id = %self.id,
                        start,
                        overlap,
                        compared = compare,
                        "[conservation] Overlapping shard bytes differ"
                    );
                }
            }

            if end > cursor {
                output.extend_from_slice(&shard.data()[(cursor - start) as usize..]);
                cursor = end;
            }
        }

        Ok(Assembled {
            output,
            base_phi: base,
            pairs_checked,
            mismatches,
        })
    }
}

struct Assembled {
    output: Vec<u8>,
    base_phi: u64,
    pairs_checked: u32,
    mismatches: u32,
}

impl fmt::Debug for ReconstructionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconstructionContext")
            .field("id", &self.id)
            .field("total_expected", &self.total_expected)
            .field("added", &self.shards.len())
            .field("total_bytes", &self.total_bytes)
            .field("state", &self.state)
            .field("policy", &self.policy)
            .finish()
    }
}
