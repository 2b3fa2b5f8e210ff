//! Cubic-spline interaction tables.
//!
//! Points sit on a uniform grid in `r` with spacing `1/scale`, starting at
//! `r = 0`. Each point stores the Hermite coefficients `(Y, F, G, H)` of the
//! interval that starts there, in table-coordinate units (`eps ∈ [0, 1)`):
//!
//! ```text
//! VV = Y + F·eps + G·eps² + H·eps³
//! FF = dVV/deps = F + 2G·eps + 3H·eps²
//! ```
//!
//! Kernels convert `FF` to a radial derivative by multiplying with `scale`.

use crate::error::{KernelError, Result};
use nonbond_math::{Lane, MAX_LANES};

/// Coefficients stored per grid point.
pub const TABLE_STRIDE: usize = 4;

/// Uniform cubic-spline table of one scalar function.
#[derive(Clone, Debug, PartialEq)]
pub struct SplineTable {
    scale: f64,
    data: Vec<f64>,
}

impl SplineTable {
    /// Build a table on `[0, r_max]` from a function returning `(V(r), dV/dr)`.
    ///
    /// Points where `f` is not finite (the origin for singular potentials) are
    /// stored as zero.
    pub fn from_fn<F>(scale: f64, r_max: f64, f: F) -> Result<Self>
    where
        F: Fn(f64) -> (f64, f64),
    {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(KernelError::InvalidTable(format!(
                "scale must be positive, got {scale}"
            )));
        }
        if !(r_max.is_finite() && r_max > 0.0) {
            return Err(KernelError::InvalidTable(format!(
                "range must be positive, got {r_max}"
            )));
        }

        let h = 1.0 / scale;
        let n_intervals = (r_max * scale).ceil() as usize + 1;
        let knots: Vec<(f64, f64)> = (0..=n_intervals)
            .map(|n| {
                let (v, d) = f(n as f64 * h);
                if v.is_finite() && d.is_finite() {
                    (v, h * d)
                } else {
                    (0.0, 0.0)
                }
            })
            .collect();

        let mut data = Vec::with_capacity(n_intervals * TABLE_STRIDE);
        for w in knots.windows(2) {
            let (v0, d0) = w[0];
            let (v1, d1) = w[1];
            let dv = v1 - v0;
            data.extend_from_slice(&[v0, d0, 3.0 * dv - 2.0 * d0 - d1, -2.0 * dv + d0 + d1]);
        }
        Ok(Self { scale, data })
    }

    /// Wrap precomputed `(Y, F, G, H)` coefficients.
    pub fn from_coefficients(scale: f64, data: Vec<f64>) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(KernelError::InvalidTable(format!(
                "scale must be positive, got {scale}"
            )));
        }
        if data.is_empty() || data.len() % TABLE_STRIDE != 0 {
            return Err(KernelError::InvalidTable(format!(
                "coefficient count {} is not a positive multiple of {}",
                data.len(),
                TABLE_STRIDE
            )));
        }
        Ok(Self { scale, data })
    }

    /// `1/r`.
    pub fn coulomb(scale: f64, r_max: f64) -> Result<Self> {
        Self::from_fn(scale, r_max, |r| (1.0 / r, -1.0 / (r * r)))
    }

    /// `-1/(6 r⁶)`, so that `c6 · V` is the dispersion energy for a premultiplied `c6`.
    pub fn dispersion(scale: f64, r_max: f64) -> Result<Self> {
        Self::from_fn(scale, r_max, |r| {
            let rinv6 = r.powi(-6);
            (-rinv6 / 6.0, rinv6 / r)
        })
    }

    /// `1/(12 r¹²)`, so that `c12 · V` is the repulsion energy for a premultiplied `c12`.
    pub fn repulsion(scale: f64, r_max: f64) -> Result<Self> {
        Self::from_fn(scale, r_max, |r| {
            let rinv12 = r.powi(-12);
            (rinv12 / 12.0, -rinv12 / r)
        })
    }

    /// Generalized Born screening `1/sqrt(x² + exp(-x²/4))` of the scaled distance `x`.
    pub fn generalized_born(scale: f64, x_max: f64) -> Result<Self> {
        Self::from_fn(scale, x_max, |x| {
            let e = (-0.25 * x * x).exp();
            let s = x * x + e;
            let v = 1.0 / s.sqrt();
            (v, -0.5 * (2.0 * x - 0.5 * x * e) * v / s)
        })
    }

    /// Grid points per unit distance.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of tabulated intervals.
    pub fn len(&self) -> usize {
        self.data.len() / TABLE_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Largest distance whose interval is stored.
    pub fn r_max(&self) -> f64 {
        self.len() as f64 / self.scale
    }

    /// True when lookups up to `r` interpolate rather than extrapolate.
    pub fn covers(&self, r: f64) -> bool {
        r < self.r_max()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    fn interval(&self, rt: f64) -> usize {
        // NaN casts to 0 and infinities saturate; both stay in bounds.
        (rt as usize).min(self.len() - 1)
    }

    /// Interpolated value and table-coordinate derivative at `rt = r · scale`.
    #[inline]
    pub fn lookup(&self, rt: f64) -> (f64, f64) {
        let n = self.interval(rt);
        let eps = rt - n as f64;
        let c = &self.data[TABLE_STRIDE * n..TABLE_STRIDE * (n + 1)];
        let (y, f, g, h) = (c[0], c[1], c[2], c[3]);
        let geps = g * eps;
        let heps2 = h * eps * eps;
        let fp = f + geps + heps2;
        (y + eps * fp, fp + geps + 2.0 * heps2)
    }

    /// Slot-wise [`lookup`](Self::lookup).
    #[inline]
    pub fn lookup_lanes<L: Lane>(&self, rt: L) -> (L, L) {
        let mut n = [0usize; MAX_LANES];
        for (k, slot) in n.iter_mut().enumerate().take(L::WIDTH) {
            *slot = self.interval(rt.extract(k));
        }
        let at = |k: usize, c: usize| self.data[TABLE_STRIDE * n[k] + c];
        let eps = L::gather(|k| rt.extract(k) - n[k] as f64);
        let y = L::gather(|k| at(k, 0));
        let f = L::gather(|k| at(k, 1));
        let g = L::gather(|k| at(k, 2));
        let h = L::gather(|k| at(k, 3));

        let geps = g * eps;
        let heps2 = h * eps * eps;
        let fp = f + geps + heps2;
        (y + eps * fp, fp + geps + L::splat(2.0) * heps2)
    }
}
