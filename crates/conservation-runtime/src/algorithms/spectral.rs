//! # Spectral Transform
//!
//! Iterative radix-2 FFT used by frequency-domain projections.
//!
//! Input bytes are zero-padded to the next power of two. The inverse
//! returns real parts scaled by `1/n`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Complex sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex {
    /// New sample.
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Magnitude.
    pub fn norm(&self) -> f64 {
        self.re.hypot(self.im)
    }

    fn mul(self, other: Complex) -> Complex {
        Complex::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }

    fn add(self, other: Complex) -> Complex {
        Complex::new(self.re + other.re, self.im + other.im)
    }

    fn sub(self, other: Complex) -> Complex {
        Complex::new(self.re - other.re, self.im - other.im)
    }
}

/// In-place FFT. `data.len()` must be a power of two.
fn fft_in_place(data: &mut [Complex], inverse: bool) {
    let n = data.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let angle = sign * 2.0 * PI / len as f64;
        let step = Complex::new(angle.cos(), angle.sin());
        for chunk in data.chunks_mut(len) {
            let mut w = Complex::new(1.0, 0.0);
            let half = len / 2;
            for k in 0..half {
                let u = chunk[k];
                let v = chunk[k + half].mul(w);
                chunk[k] = u.add(v);
                chunk[k + half] = u.sub(v);
                w = w.mul(step);
            }
        }
        len <<= 1;
    }
}

/// Forward spectrum of `bytes`, zero-padded to a power of two.
pub fn forward_spectrum(bytes: &[u8]) -> Vec<Complex> {
    let n = bytes.len().max(1).next_power_of_two();
    let mut data: Vec<Complex> = bytes
        .iter()
        .map(|&b| Complex::new(f64::from(b), 0.0))
        .chain(std::iter::repeat(Complex::default()))
        .take(n)
        .collect();
    fft_in_place(&mut data, false);
    data
}

/// Inverse of [`forward_spectrum`]: real samples, scaled by `1/n`.
pub fn inverse_spectrum(spectrum: &[Complex]) -> Vec<f64> {
    let mut data = spectrum.to_vec();
    fft_in_place(&mut data, true);
    let n = data.len().max(1) as f64;
    data.into_iter().map(|c| c.re / n).collect()
}

/// Whether `samples` round back to `bytes` with a zero tail.
pub fn samples_match(samples: &[f64], bytes: &[u8]) -> bool {
    if samples.len() < bytes.len() {
        return false;
    }
    let body = samples
        .iter()
        .zip(bytes)
        .all(|(s, &b)| (s - f64::from(b)).abs() < 0.5);
    let tail = samples[bytes.len()..].iter().all(|s| s.abs() < 0.5);
    body && tail
}
