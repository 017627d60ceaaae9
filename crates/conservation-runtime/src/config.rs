//! Runtime configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use conservation_runtime::{ConservationPolicy, OverlapCheck, RuntimeConfigBuilder};
//!
//! let config = RuntimeConfigBuilder::new()
//!     .conservation_policy(ConservationPolicy::Warn)
//!     .overlap_check(OverlapCheck::Full)
//!     .max_reconstruction_bytes(64 << 20)
//!     .build()?;
//! ```

use crate::algorithms::extraction::PARALLEL_THRESHOLD;
use crate::domain::{ConservationError, Result, DEFAULT_OVERLAP_WINDOW, MAX_RECONSTRUCTION_BYTES};
use serde::{Deserialize, Serialize};
use std::env;

/// What finalize does when the reconstructed buffer is not conserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConservationPolicy {
    /// Fail the reconstruction.
    #[default]
    Strict,
    /// Log, flag the report, and return the projection anyway.
    Warn,
}

/// How much of each shard overlap is byte-compared during reassembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapCheck {
    /// Compare at most `window` leading bytes of each overlap.
    Bounded {
        /// Comparison window in bytes
        window: usize,
    },
    /// Compare every overlapping byte.
    Full,
}

impl Default for OverlapCheck {
    fn default() -> Self {
        Self::Bounded {
            window: DEFAULT_OVERLAP_WINDOW,
        }
    }
}

impl OverlapCheck {
    /// Bytes to compare for an overlap of `overlap` bytes.
    pub fn compare_len(&self, overlap: usize) -> usize {
        match self {
            Self::Bounded { window } => overlap.min(*window),
            Self::Full => overlap,
        }
    }
}

/// Policy a reconstruction context runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionPolicy {
    /// Conservation mismatch handling
    pub conservation: ConservationPolicy,
    /// Overlap comparison extent
    pub overlap_check: OverlapCheck,
    /// Hard upper bound on the reconstructed size
    pub max_bytes: u64,
}

impl Default for ReconstructionPolicy {
    fn default() -> Self {
        Self {
            conservation: ConservationPolicy::Strict,
            overlap_check: OverlapCheck::default(),
            max_bytes: MAX_RECONSTRUCTION_BYTES,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error, or an EnvFilter string)
    pub level: String,
    /// JSON formatted logs
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Conservation mismatch handling on finalize
    pub conservation_policy: ConservationPolicy,
    /// Overlap comparison extent on finalize
    pub overlap_check: OverlapCheck,
    /// Hard upper bound on a reconstructed buffer
    pub max_reconstruction_bytes: u64,
    /// Batch size at which extraction runs on the rayon pool
    pub parallel_extraction_threshold: usize,
    /// Logging
    pub log: LogConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            conservation_policy: ConservationPolicy::Strict,
            overlap_check: OverlapCheck::default(),
            max_reconstruction_bytes: MAX_RECONSTRUCTION_BYTES,
            parallel_extraction_threshold: PARALLEL_THRESHOLD,
            log: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CR_CONSERVATION_POLICY`: `strict` or `warn` (default: strict)
    /// - `CR_OVERLAP_WINDOW`: `full` or a byte count (default: 64)
    /// - `CR_MAX_RECONSTRUCTION_BYTES`: hard size bound (default: 1 GiB)
    /// - `CR_PARALLEL_THRESHOLD`: parallel extraction batch size (default: 4)
    /// - `CR_LOG_LEVEL` or `RUST_LOG`: log filter (default: info)
    /// - `CR_JSON_LOGS`: JSON logs (default: false)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let conservation_policy = match lookup("CR_CONSERVATION_POLICY")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Some("warn") => ConservationPolicy::Warn,
            Some("strict") => ConservationPolicy::Strict,
            _ => defaults.conservation_policy,
        };

        let overlap_check = match lookup("CR_OVERLAP_WINDOW") {
            Some(v) if v.eq_ignore_ascii_case("full") => OverlapCheck::Full,
            Some(v) => v
                .parse()
                .map(|window| OverlapCheck::Bounded { window })
                .unwrap_or(defaults.overlap_check),
            None => defaults.overlap_check,
        };

        Self {
            conservation_policy,
            overlap_check,
            max_reconstruction_bytes: lookup("CR_MAX_RECONSTRUCTION_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_reconstruction_bytes),
            parallel_extraction_threshold: lookup("CR_PARALLEL_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.parallel_extraction_threshold),
            log: LogConfig {
                level: lookup("CR_LOG_LEVEL")
                    .or_else(|| lookup("RUST_LOG"))
                    .unwrap_or(defaults.log.level),
                json: lookup("CR_JSON_LOGS")
                    .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                    .unwrap_or(defaults.log.json),
            },
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConservationError::InvalidArgument(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if let OverlapCheck::Bounded { window: 0 } = self.overlap_check {
            return Err(ConservationError::InvalidArgument(
                "overlap window cannot be 0".to_string(),
            ));
        }
        if self.max_reconstruction_bytes == 0 {
            return Err(ConservationError::InvalidArgument(
                "max_reconstruction_bytes cannot be 0".to_string(),
            ));
        }
        if self.parallel_extraction_threshold == 0 {
            return Err(ConservationError::InvalidArgument(
                "parallel_extraction_threshold cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Policy handed to reconstruction contexts.
    pub fn reconstruction_policy(&self) -> ReconstructionPolicy {
        ReconstructionPolicy {
            conservation: self.conservation_policy,
            overlap_check: self.overlap_check,
            max_bytes: self.max_reconstruction_bytes,
        }
    }
}

/// Builder for [`RuntimeConfig`] with validation.
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    conservation_policy: Option<ConservationPolicy>,
    overlap_check: Option<OverlapCheck>,
    max_reconstruction_bytes: Option<u64>,
    parallel_extraction_threshold: Option<usize>,
    log: Option<LogConfig>,
}

impl RuntimeConfigBuilder {
    /// Create a new builder with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conservation policy.
    pub fn conservation_policy(mut self, policy: ConservationPolicy) -> Self {
        self.conservation_policy = Some(policy);
        self
    }

    /// Set the overlap check.
    pub fn overlap_check(mut self, check: OverlapCheck) -> Self {
        self.overlap_check = Some(check);
        self
    }

    /// Set the reconstruction size bound.
    pub fn max_reconstruction_bytes(mut self, bytes: u64) -> Self {
        self.max_reconstruction_bytes = Some(bytes);
        self
    }

    /// Set the parallel extraction threshold.
    pub fn parallel_extraction_threshold(mut self, threshold: usize) -> Self {
        self.parallel_extraction_threshold = Some(threshold);
        self
    }

    /// Set logging.
    pub fn log(mut self, log: LogConfig) -> Self {
        self.log = Some(log);
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<RuntimeConfig> {
        let defaults = RuntimeConfig::default();
        let config = RuntimeConfig {
            conservation_policy: self
                .conservation_policy
                .unwrap_or(defaults.conservation_policy),
            overlap_check: self.overlap_check.unwrap_or(defaults.overlap_check),
            max_reconstruction_bytes: self
                .max_reconstruction_bytes
                .unwrap_or(defaults.max_reconstruction_bytes),
            parallel_extraction_threshold: self
                .parallel_extraction_threshold
                .unwrap_or(defaults.parallel_extraction_threshold),
            log: self.log.unwrap_or(defaults.log),
        };
        config.validate()?;
        Ok(config)
    }
}
