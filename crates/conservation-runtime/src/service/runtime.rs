//! Conservation Runtime Service
//!
//! Implements the [`ConservationApi`] port using injected collaborators.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::{Keccak256Fingerprint, ModularOracle};
use crate::algorithms::{extraction, BatchExtraction, ReconstructionContext};
use crate::config::RuntimeConfig;
use crate::domain::{
    BoundaryRegion, ConservationDomain, ConservationError, Projection, ProjectionKind, Result,
    Shard, Witness,
};
use crate::metrics::{MetricsSnapshot, RuntimeMetrics};
use crate::ports::{ChecksumOracle, ConservationApi, FingerprintFunction};

/// Conservation runtime service.
pub struct ConservationRuntime {
    config: RuntimeConfig,
    /// Checksum oracle (driven port)
    oracle: Arc<dyn ChecksumOracle>,
    /// Witness fingerprint function (driven port)
    fingerprint: Arc<dyn FingerprintFunction>,
    metrics: Arc<RuntimeMetrics>,
}

impl ConservationRuntime {
    /// Runtime with default configuration, the modular oracle and Keccak-256.
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            oracle: Arc::new(ModularOracle),
            fingerprint: Arc::new(Keccak256Fingerprint),
            metrics: Arc::new(RuntimeMetrics::new()),
        }
    }

    /// Runtime with a validated configuration.
    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Replace the checksum oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn ChecksumOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the witness fingerprint function.
    pub fn with_fingerprint(mut self, fingerprint: Arc<dyn FingerprintFunction>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Shared metrics handle.
    pub fn metrics_handle(&self) -> Arc<RuntimeMetrics> {
        self.metrics.clone()
    }

    /// Name of the witness fingerprint function.
    pub fn fingerprint_name(&self) -> &'static str {
        self.fingerprint.name()
    }
}

impl Default for ConservationRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConservationRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConservationRuntime")
            .field("config", &self.config)
            .field("fingerprint", &self.fingerprint.name())
            .finish()
    }
}

impl ConservationApi for ConservationRuntime {
    fn create_domain<'buf>(
        &self,
        size: usize,
        initial_budget: u8,
    ) -> Result<ConservationDomain<'buf>> {
        let domain = ConservationDomain::with_oracle(size, initial_budget, self.oracle.clone())?;
        self.metrics.record_domain_created();
        Ok(domain)
    }

    fn budget_alloc(&self, domain: &ConservationDomain<'_>, amount: u8) -> Result<()> {
        let result = domain.budget_alloc(amount);
        match &result {
            Ok(()) => self.metrics.record_budget_alloc(true),
            Err(ConservationError::BudgetExceeded { .. }) => {
                self.metrics.record_budget_alloc(false)
            }
            Err(_) => {}
        }
        result
    }

    fn budget_release(&self, domain: &ConservationDomain<'_>, amount: u8) -> Result<()> {
        domain.budget_release(amount)?;
        self.metrics.record_budget_release();
        Ok(())
    }

    fn verify_domain(&self, domain: &ConservationDomain<'_>) -> Result<bool> {
        let conserved = domain.verify()?;
        if !conserved {
            self.metrics.record_conservation_violation();
            warn!(size = domain.size(), "[conservation] Domain not conserved");
        }
        Ok(conserved)
    }

    fn generate_witness(&self, data: &[u8]) -> Result<Witness> {
        let witness = Witness::generate_with(self.fingerprint.as_ref(), data)?;
        self.metrics.record_witness_generated();
        debug!(
            len = data.len(),
            function = self.fingerprint.name(),
            "[conservation] Witness generated"
        );
        Ok(witness)
    }

    fn verify_witness(&self, witness: &Witness, data: &[u8]) -> Result<()> {
        let result = witness.check_with(self.fingerprint.as_ref(), data);
        self.metrics.record_witness_check(result.is_ok());
        result
    }

    fn create_projection<'a>(
        &self,
        kind: ProjectionKind,
        source: &'a [u8],
    ) -> Result<Projection<'a>> {
        Projection::with_oracle(kind, source, self.oracle.clone())
    }

    fn extract(&self, projection: &Projection<'_>, region: &BoundaryRegion) -> Result<Shard> {
        let result = extraction::extract(projection, region);
        match &result {
            Ok(_) => self.metrics.record_shards_extracted(1, 0),
            Err(_) => self.metrics.record_shards_extracted(0, 1),
        }
        result
    }

    fn extract_batch(
        &self,
        projection: &Projection<'_>,
        regions: &[BoundaryRegion],
    ) -> BatchExtraction {
        let batch = extraction::extract_batch_with_threshold(
            projection,
            regions,
            self.config.parallel_extraction_threshold,
        );
        self.metrics
            .record_shards_extracted(batch.succeeded(), batch.failed());
        batch
    }

    fn begin_reconstruction(&self, total_expected: u32) -> Result<ReconstructionContext> {
        ReconstructionContext::with_policy(
            total_expected,
            self.config.reconstruction_policy(),
            self.oracle.clone(),
            self.metrics.clone(),
        )
    }

    fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
