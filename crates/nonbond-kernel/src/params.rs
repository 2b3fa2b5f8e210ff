//! Per-particle parameters and the (type, type) coefficient table.

use crate::error::{KernelError, Result};

/// Coefficients per type pair for Lennard-Jones and tabulated van der Waals.
pub const LJ_STRIDE: usize = 2;
/// Coefficients per type pair for Buckingham.
pub const BHAM_STRIDE: usize = 3;

/// Charge, van der Waals type and optional Born radius for every particle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleParams {
    /// Partial charges (elementary charge units).
    pub charges: Vec<f64>,
    /// Dense van der Waals type index per particle.
    pub vdw_types: Vec<usize>,
    /// `1/sqrt(born_radius)` per particle, used by Generalized Born only.
    pub inv_sqrt_born_radii: Option<Vec<f64>>,
}

impl ParticleParams {
    pub fn new(charges: Vec<f64>, vdw_types: Vec<usize>) -> Self {
        Self {
            charges,
            vdw_types,
            inv_sqrt_born_radii: None,
        }
    }

    /// Attach Born radii, stored as `1/sqrt(r)`.
    pub fn with_born_radii(mut self, born_radii: &[f64]) -> Self {
        self.inv_sqrt_born_radii = Some(born_radii.iter().map(|r| 1.0 / r.sqrt()).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// Check array lengths against `n_particles` and type indices against `ntype`.
    pub fn validate(&self, n_particles: usize, ntype: usize) -> Result<()> {
        if self.charges.len() != n_particles || self.vdw_types.len() != n_particles {
            return Err(KernelError::InvalidParameters(format!(
                "expected {} particles, found {} charges and {} types",
                n_particles,
                self.charges.len(),
                self.vdw_types.len()
            )));
        }
        if let Some(t) = self.vdw_types.iter().find(|&&t| t >= ntype) {
            return Err(KernelError::InvalidParameters(format!(
                "type index {t} outside table of {ntype} types"
            )));
        }
        if let Some(isa) = &self.inv_sqrt_born_radii {
            if isa.len() != n_particles {
                return Err(KernelError::InvalidParameters(format!(
                    "expected {} Born radii, found {}",
                    n_particles,
                    isa.len()
                )));
            }
        }
        Ok(())
    }
}

/// Flat symmetric table of van der Waals coefficients indexed by type pair.
///
/// Coefficients are stored the way the kernels consume them: `c6` is 6·C6 and
/// `c12` is 12·C12, so that `f·r² = c12/r¹² − c6/r⁶` with no extra factors.
/// Buckingham rows hold `(6·C6, A, B)`.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionParameterTable {
    ntype: usize,
    stride: usize,
    data: Vec<f64>,
}

impl InteractionParameterTable {
    /// Wrap premultiplied coefficients of size `ntype² · stride`.
    pub fn new(ntype: usize, stride: usize, data: Vec<f64>) -> Result<Self> {
        if stride == 0 {
            return Err(KernelError::InvalidParameters("stride must be positive".into()));
        }
        if data.len() != ntype * ntype * stride {
            return Err(KernelError::InvalidParameters(format!(
                "{} types with stride {} need {} values, found {}",
                ntype,
                stride,
                ntype * ntype * stride,
                data.len()
            )));
        }
        Ok(Self {
            ntype,
            stride,
            data,
        })
    }

    /// Lennard-Jones table from plain `(C6, C12)` per type pair.
    pub fn lennard_jones<F>(ntype: usize, mut coeffs: F) -> Self
    where
        F: FnMut(usize, usize) -> (f64, f64),
    {
        let mut data = Vec::with_capacity(ntype * ntype * LJ_STRIDE);
        for i in 0..ntype {
            for j in 0..ntype {
                let (c6, c12) = coeffs(i, j);
                data.extend_from_slice(&[6.0 * c6, 12.0 * c12]);
            }
        }
        Self {
            ntype,
            stride: LJ_STRIDE,
            data,
        }
    }

    /// Lennard-Jones table from per-type σ and ε with Lorentz-Berthelot mixing.
    pub fn from_sigma_epsilon(sigma: &[f64], epsilon: &[f64]) -> Result<Self> {
        if sigma.len() != epsilon.len() {
            return Err(KernelError::InvalidParameters(format!(
                "{} sigmas but {} epsilons",
                sigma.len(),
                epsilon.len()
            )));
        }
        Ok(Self::lennard_jones(sigma.len(), |i, j| {
            let s = 0.5 * (sigma[i] + sigma[j]);
            let e = (epsilon[i] * epsilon[j]).sqrt();
            let s6 = s.powi(6);
            (4.0 * e * s6, 4.0 * e * s6 * s6)
        }))
    }

    /// Buckingham table from plain `(C6, A, B)` per type pair.
    pub fn buckingham<F>(ntype: usize, mut coeffs: F) -> Self
    where
        F: FnMut(usize, usize) -> (f64, f64, f64),
    {
        let mut data = Vec::with_capacity(ntype * ntype * BHAM_STRIDE);
        for i in 0..ntype {
            for j in 0..ntype {
                let (c6, a, b) = coeffs(i, j);
                data.extend_from_slice(&[6.0 * c6, a, b]);
            }
        }
        Self {
            ntype,
            stride: BHAM_STRIDE,
            data,
        }
    }

    /// Table with all-zero coefficients, for kernels without van der Waals.
    pub fn empty(ntype: usize, stride: usize) -> Self {
        Self {
            ntype,
            stride,
            data: vec![0.0; ntype * ntype * stride],
        }
    }

    pub fn ntype(&self) -> usize {
        self.ntype
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Coefficients for the type pair `(ti, tj)`.
    #[inline]
    pub fn pair(&self, ti: usize, tj: usize) -> &[f64] {
        let o = (ti * self.ntype + tj) * self.stride;
        &self.data[o..o + self.stride]
    }

    /// Coefficient `k` of the pair `(ti, tj)`.
    #[inline]
    pub fn coeff(&self, ti: usize, tj: usize, k: usize) -> f64 {
        self.data[(ti * self.ntype + tj) * self.stride + k]
    }

    /// True when `pair(a, b) == pair(b, a)` for every type pair.
    pub fn is_symmetric(&self) -> bool {
        (0..self.ntype).all(|i| (i + 1..self.ntype).all(|j| self.pair(i, j) == self.pair(j, i)))
    }
}
