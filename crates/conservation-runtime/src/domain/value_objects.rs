//! # Domain Value Objects
//!
//! Immutable value types: projection kinds, boundary regions, affine maps
//! and fingerprints.

use super::errors::{ConservationError, Result};
use super::invariants::{
    invariant_region_within, pages_touched, CONSERVATION_MODULUS, FINGERPRINT_LEN,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-size fingerprint over a byte range.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}..)", &self.to_hex()[..16])
    }
}

/// Projection kind. Fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionKind {
    /// Geometric coordinate space.
    Linear,
    /// Frequency-domain context; allows spectral transforms.
    FrequencyDomain,
}

impl ProjectionKind {
    /// Parse a kind tag. Unrecognized tags are rejected.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "frequency" | "frequency-domain" | "frequency_domain" => Ok(Self::FrequencyDomain),
            other => Err(ConservationError::InvalidArgument(format!(
                "unrecognized projection kind: {}",
                other
            ))),
        }
    }
}

/// A range over a projection's linear coordinate space.
///
/// The range is half-open: `[start_coord, end_coord)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryRegion {
    /// First coordinate (inclusive).
    pub start_coord: usize,
    /// Last coordinate (exclusive).
    pub end_coord: usize,
    /// Pages the region claims to span.
    pub page_count: usize,
    /// Checksum class tag in `[0, K)`.
    pub region_class: u8,
    /// Caller asserts the region payload is conserved on its own.
    pub is_conserved: bool,
}

impl BoundaryRegion {
    /// Region over `[start, end)` with `page_count` derived from the range.
    pub fn new(start_coord: usize, end_coord: usize) -> Self {
        Self {
            start_coord,
            end_coord,
            page_count: pages_touched(start_coord, end_coord),
            region_class: 0,
            is_conserved: false,
        }
    }

    /// Tag the region with a checksum class.
    pub fn with_class(mut self, region_class: u8) -> Self {
        self.region_class = region_class;
        self
    }

    /// Assert that the region payload must be conserved.
    pub fn asserting_conserved(mut self) -> Self {
        self.is_conserved = true;
        self
    }

    /// Region length in coordinates. Zero for malformed regions.
    pub fn len(&self) -> usize {
        self.end_coord.saturating_sub(self.start_coord)
    }

    /// True for empty or inverted regions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate against a projection of `extent` coordinates.
    pub fn validate(&self, extent: usize) -> Result<()> {
        invariant_region_within(self.start_coord, self.end_coord, extent)?;

        let touched = pages_touched(self.start_coord, self.end_coord);
        if self.page_count == 0 || self.page_count > touched {
            return Err(ConservationError::boundary(
                self.start_coord,
                self.end_coord,
                format!("page_count {} (region touches {})", self.page_count, touched),
            ));
        }

        if self.region_class >= CONSERVATION_MODULUS {
            return Err(ConservationError::boundary(
                self.start_coord,
                self.end_coord,
                format!("region_class {} outside [0, {})", self.region_class, CONSERVATION_MODULUS),
            ));
        }

        Ok(())
    }

    /// Split `[0, extent)` into `parts` contiguous regions with no gaps.
    ///
    /// The last region absorbs the remainder.
    pub fn partition(extent: usize, parts: usize) -> Result<Vec<Self>> {
        if parts == 0 || extent == 0 || parts > extent {
            return Err(ConservationError::InvalidArgument(format!(
                "cannot partition {} coordinates into {} regions",
                extent, parts
            )));
        }
        let step = extent / parts;
        Ok((0..parts)
            .map(|i| {
                let start = i * step;
                let end = if i + 1 == parts { extent } else { start + step };
                Self::new(start, end)
            })
            .collect())
    }
}

/// 3x3 homogeneous affine map over 2D coordinates (row-major).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearMap(pub [[f64; 3]; 3]);

impl Default for LinearMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl LinearMap {
    /// Identity map.
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Scale about the origin.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self([[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Translation.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self([[1.0, 0.0, dx], [0.0, 1.0, dy], [0.0, 0.0, 1.0]])
    }

    /// Rotation by `angle` radians about `(cx, cy)`.
    pub fn rotation(angle: f64, cx: f64, cy: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let to_origin = Self::translation(-cx, -cy);
        let rotate = Self([[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]]);
        let back = Self::translation(cx, cy);
        back.compose(&rotate).compose(&to_origin)
    }

    /// `self * other`: applies `other` first, then `self`.
    pub fn compose(&self, other: &LinearMap) -> LinearMap {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[i][k] * other.0[k][j]).sum();
            }
        }
        LinearMap(out)
    }

    /// All entries finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }

    /// Apply to a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.0;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        let px = m[0][0] * x + m[0][1] * y + m[0][2];
        let py = m[1][0] * x + m[1][1] * y + m[1][2];
        if w != 0.0 && w != 1.0 {
            (px / w, py / w)
        } else {
            (px, py)
        }
    }
}
