//! Metrics hooks for runtime operations
//!
//! Lock-free counters shared by the runtime service and the reconstruction
//! contexts it hands out.
//!
//! ## Usage
//!
//! ```ignore
//! use conservation_runtime::metrics::RuntimeMetrics;
//!
//! let metrics = RuntimeMetrics::new();
//! metrics.record_shards_extracted(4, 1);
//! assert_eq!(metrics.snapshot().shards_extracted, 4);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for runtime operations.
#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    /// Domains created
    pub domains_created: AtomicU64,
    /// Successful budget allocations
    pub budget_allocations: AtomicU64,
    /// Allocations rejected for insufficient budget
    pub budget_rejections: AtomicU64,
    /// Budget releases
    pub budget_releases: AtomicU64,
    /// Witnesses generated
    pub witnesses_generated: AtomicU64,
    /// Witness checks that did not match
    pub witness_mismatches: AtomicU64,
    /// Shards extracted
    pub shards_extracted: AtomicU64,
    /// Regions that failed extraction
    pub extraction_failures: AtomicU64,
    /// Reconstructions finalized
    pub reconstructions_finalized: AtomicU64,
    /// Reconstructions that failed
    pub reconstructions_failed: AtomicU64,
    /// Overlap byte mismatches seen during reassembly
    pub overlap_mismatches: AtomicU64,
    /// Conservation violations seen on finalize or domain check
    pub conservation_violations: AtomicU64,
}

impl RuntimeMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record domain creation.
    pub fn record_domain_created(&self) {
        self.domains_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a budget allocation attempt.
    pub fn record_budget_alloc(&self, granted: bool) {
        if granted {
            self.budget_allocations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.budget_rejections.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a budget release.
    pub fn record_budget_release(&self) {
        self.budget_releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Record witness generation.
    pub fn record_witness_generated(&self) {
        self.witnesses_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a witness check.
    pub fn record_witness_check(&self, matched: bool) {
        if !matched {
            self.witness_mismatches.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an extraction pass.
    pub fn record_shards_extracted(&self, succeeded: usize, failed: usize) {
        self.shards_extracted
            .fetch_add(succeeded as u64, Ordering::Relaxed);
        self.extraction_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    /// Record a finalized reconstruction.
    pub fn record_reconstruction_finalized(&self, overlap_mismatches: usize, conserved: bool) {
        self.reconstructions_finalized.fetch_add(1, Ordering::Relaxed);
        self.overlap_mismatches
            .fetch_add(overlap_mismatches as u64, Ordering::Relaxed);
        if !conserved {
            self.conservation_violations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a failed reconstruction.
    pub fn record_reconstruction_failed(&self) {
        self.reconstructions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a conservation violation outside reconstruction.
    pub fn record_conservation_violation(&self) {
        self.conservation_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            domains_created: self.domains_created.load(Ordering::Relaxed),
            budget_allocations: self.budget_allocations.load(Ordering::Relaxed),
            budget_rejections: self.budget_rejections.load(Ordering::Relaxed),
            budget_releases: self.budget_releases.load(Ordering::Relaxed),
            witnesses_generated: self.witnesses_generated.load(Ordering::Relaxed),
            witness_mismatches: self.witness_mismatches.load(Ordering::Relaxed),
            shards_extracted: self.shards_extracted.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            reconstructions_finalized: self.reconstructions_finalized.load(Ordering::Relaxed),
            reconstructions_failed: self.reconstructions_failed.load(Ordering::Relaxed),
            overlap_mismatches: self.overlap_mismatches.load(Ordering::Relaxed),
            conservation_violations: self.conservation_violations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RuntimeMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Domains created
    pub domains_created: u64,
    /// Successful budget allocations
    pub budget_allocations: u64,
    /// Allocations rejected for insufficient budget
    pub budget_rejections: u64,
    /// Budget releases
    pub budget_releases: u64,
    /// Witnesses generated
    pub witnesses_generated: u64,
    /// Witness checks that did not match
    pub witness_mismatches: u64,
    /// Shards extracted
    pub shards_extracted: u64,
    /// Regions that failed extraction
    pub extraction_failures: u64,
    /// Reconstructions finalized
    pub reconstructions_finalized: u64,
    /// Reconstructions that failed
    pub reconstructions_failed: u64,
    /// Overlap byte mismatches
    pub overlap_mismatches: u64,
    /// Conservation violations
    pub conservation_violations: u64,
}

impl MetricsSnapshot {
    /// Fraction of budget allocations that were rejected.
    pub fn budget_rejection_rate(&self) -> f64 {
        let total = self.budget_allocations + self.budget_rejections;
        if total == 0 {
            0.0
        } else {
            self.budget_rejections as f64 / total as f64
        }
    }
}
