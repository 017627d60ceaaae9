//! # Projection
//!
//! Named transformation context over a source buffer. Shards are cut from
//! a projection and reassembled into a new one.
//!
//! Transforms act on the coordinate space, never on the source bytes, and
//! compose into a single affine [`LinearMap`]. A transform that fails
//! validation leaves the previous state untouched.

use super::errors::{ConservationError, Result};
use super::invariants::PAGE_SIZE;
use super::value_objects::{LinearMap, ProjectionKind};
use crate::adapters::ModularOracle;
use crate::algorithms::spectral::{forward_spectrum, inverse_spectrum, samples_match, Complex};
use crate::ports::outbound::ChecksumOracle;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Transformation context over borrowed or owned bytes.
#[derive(Clone)]
pub struct Projection<'a> {
    kind: ProjectionKind,
    source: Cow<'a, [u8]>,
    transform: LinearMap,
    spectrum: Option<Vec<Complex>>,
    residue: u8,
    oracle: Arc<dyn ChecksumOracle>,
}

impl<'a> Projection<'a> {
    /// Create a projection over `source`.
    pub fn create(kind: ProjectionKind, source: impl Into<Cow<'a, [u8]>>) -> Result<Self> {
        Self::with_oracle(kind, source, Arc::new(ModularOracle))
    }

    /// Create a projection from a kind tag such as `"linear"`.
    pub fn from_tag(tag: &str, source: impl Into<Cow<'a, [u8]>>) -> Result<Self> {
        Self::create(ProjectionKind::from_tag(tag)?, source)
    }

    /// Create a projection that checksums through `oracle`.
    pub fn with_oracle(
        kind: ProjectionKind,
        source: impl Into<Cow<'a, [u8]>>,
        oracle: Arc<dyn ChecksumOracle>,
    ) -> Result<Self> {
        let source = source.into();
        if source.is_empty() {
            return Err(ConservationError::InvalidArgument(
                "projection source is empty".to_string(),
            ));
        }
        let residue = oracle.residue(&source);

        debug!(?kind, len = source.len(), residue, "[conservation] Projection created");

        Ok(Self {
            kind,
            source,
            transform: LinearMap::identity(),
            spectrum: None,
            residue,
            oracle,
        })
    }

    /// Projection kind.
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Source bytes in canonical order.
    pub fn data(&self) -> &[u8] {
        &self.source
    }

    /// Number of addressable coordinates.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Always false for a constructed projection.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Residue of the source recorded at creation.
    pub fn residue(&self) -> u8 {
        self.residue
    }

    /// Oracle used for checksums.
    pub fn oracle(&self) -> &Arc<dyn ChecksumOracle> {
        &self.oracle
    }

    /// Accumulated transform.
    pub fn transform(&self) -> &LinearMap {
        &self.transform
    }

    /// Spectrum from the last forward frequency transform.
    pub fn spectrum(&self) -> Option<&[Complex]> {
        self.spectrum.as_deref()
    }

    /// Apply a general linear map on top of the current transform.
    pub fn transform_linear(&mut self, matrix: LinearMap) -> Result<()> {
        if !matrix.is_finite() {
            return Err(ConservationError::TransformFailed(
                "matrix has non-finite entries".to_string(),
            ));
        }
        let composed = matrix.compose(&self.transform);
        if !composed.is_finite() {
            return Err(ConservationError::TransformFailed(
                "composed transform overflowed".to_string(),
            ));
        }
        self.transform = composed;
        Ok(())
    }

    /// Scale the coordinate space. Factors must be finite and positive.
    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<()> {
        if !(sx.is_finite() && sy.is_finite()) || sx <= 0.0 || sy <= 0.0 {
            return Err(ConservationError::InvalidArgument(format!(
                "scale factors must be finite and positive, got ({}, {})",
                sx, sy
            )));
        }
        self.transform_linear(LinearMap::scaling(sx, sy))
    }

    /// Rotate by `angle` radians about `(cx, cy)`.
    pub fn rotate(&mut self, angle: f64, cx: f64, cy: f64) -> Result<()> {
        if !(angle.is_finite() && cx.is_finite() && cy.is_finite()) {
            return Err(ConservationError::InvalidArgument(
                "rotation parameters must be finite".to_string(),
            ));
        }
        self.transform_linear(LinearMap::rotation(angle, cx, cy))
    }

    /// Translate by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) -> Result<()> {
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(ConservationError::InvalidArgument(
                "translation must be finite".to_string(),
            ));
        }
        self.transform_linear(LinearMap::translation(dx, dy))
    }

    /// Forward (`inverse == false`) or inverse frequency transform.
    ///
    /// Only legal on [`ProjectionKind::FrequencyDomain`]. The forward pass
    /// stores the spectrum of the source; the inverse checks that the stored
    /// spectrum reproduces the source and clears it.
    pub fn transform_frequency(&mut self, inverse: bool) -> Result<()> {
        if self.kind != ProjectionKind::FrequencyDomain {
            return Err(ConservationError::InvalidArgument(format!(
                "frequency transform on {:?} projection",
                self.kind
            )));
        }

        if !inverse {
            self.spectrum = Some(forward_spectrum(&self.source));
            return Ok(());
        }

        let spectrum = self.spectrum.as_deref().ok_or_else(|| {
            ConservationError::TransformFailed("no spectrum to invert".to_string())
        })?;
        let samples = inverse_spectrum(spectrum);
        if !samples_match(&samples, &self.source) {
            return Err(ConservationError::TransformFailed(
                "inverse spectrum does not reproduce source".to_string(),
            ));
        }
        self.spectrum = None;
        Ok(())
    }

    /// `(width, height)`: rows of up to one page.
    pub fn get_dimensions(&self) -> Result<(usize, usize)> {
        if !self.is_structurally_valid() {
            return Err(ConservationError::InvalidProjection(
                "structural check failed".to_string(),
            ));
        }
        let width = self.source.len().min(PAGE_SIZE);
        let height = self.source.len().div_ceil(width);
        Ok((width, height))
    }

    /// Map a canonical coordinate through the accumulated transform.
    pub fn map_point(&self, coord: usize) -> Result<(f64, f64)> {
        let (width, _) = self.get_dimensions()?;
        if coord >= self.source.len() {
            return Err(ConservationError::InvalidArgument(format!(
                "coordinate {} beyond extent {}",
                coord,
                self.source.len()
            )));
        }
        let x = (coord % width) as f64;
        let y = (coord / width) as f64;
        Ok(self.transform.apply(x, y))
    }

    /// Structural and checksum sanity check.
    pub fn is_valid(&self) -> bool {
        self.is_structurally_valid() && self.oracle.residue(&self.source) == self.residue
    }

    /// [`is_valid`](Self::is_valid) as a `Result`.
    pub fn ensure_valid(&self) -> Result<()> {
        self.ensure_structure()?;
        let residue = self.oracle.residue(&self.source);
        if residue != self.residue {
            return Err(ConservationError::InvalidProjection(format!(
                "residue drifted from {} to {}",
                self.residue, residue
            )));
        }
        Ok(())
    }

    /// Structural half of [`Projection::ensure_valid`]. Does not touch the
    /// source bytes, so it is O(1) in the projection length.
    pub(crate) fn ensure_structure(&self) -> Result<()> {
        if !self.is_structurally_valid() {
            return Err(ConservationError::InvalidProjection(
                "structural check failed".to_string(),
            ));
        }
        Ok(())
    }

    fn is_structurally_valid(&self) -> bool {
        if self.source.is_empty() || !self.transform.is_finite() {
            return false;
        }
        match &self.spectrum {
            None => true,
            Some(spectrum) => {
                self.kind == ProjectionKind::FrequencyDomain
                    && spectrum.len().is_power_of_two()
                    && spectrum.len() >= self.source.len()
            }
        }
    }

    /// Detach from borrowed bytes.
    pub fn into_owned(self) -> Projection<'static> {
        Projection {
            kind: self.kind,
            source: Cow::Owned(self.source.into_owned()),
            transform: self.transform,
            spectrum: self.spectrum,
            residue: self.residue,
            oracle: self.oracle,
        }
    }

    /// Take the source bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.source.into_owned()
    }

    /// Release the wrapper. Borrowed source bytes are untouched.
    pub fn destroy(self) {
        debug!(kind = ?self.kind, len = self.source.len(), "[conservation] Projection destroyed");
    }
}

impl fmt::Debug for Projection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("kind", &self.kind)
            .field("len", &self.source.len())
            .field("residue", &self.residue)
            .field("transform", &self.transform)
            .field("has_spectrum", &self.spectrum.is_some())
            .finish()
    }
}
