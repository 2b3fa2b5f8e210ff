//! Van der Waals models.
//!
//! Coefficients arrive premultiplied as stored in
//! [`InteractionParameterTable`](crate::params::InteractionParameterTable):
//! `c[0] = 6·C6`, `c[1] = 12·C12` (or `A` for Buckingham), `c[2] = B`.

use crate::config::VdwKind;
use crate::params::{BHAM_STRIDE, LJ_STRIDE};
use crate::table::SplineTable;
use nonbond_math::Lane;
use std::sync::Arc;

/// Largest number of coefficients any model reads per type pair.
pub const MAX_STRIDE: usize = 3;

const ONE_SIXTH: f64 = 1.0 / 6.0;
const ONE_TWELFTH: f64 = 1.0 / 12.0;

/// A van der Waals model evaluated on lanes.
pub trait VanDerWaals: Send + Sync + 'static {
    const KIND: VdwKind;
    /// False only for the model without van der Waals; the kernel then skips types.
    const ACTIVE: bool = true;
    /// Coefficients per type pair.
    const STRIDE: usize;

    /// `(potential, force scalar)`; the potential is only meaningful when `energy` is set.
    fn pair<L: Lane>(
        &self,
        c: &[L; MAX_STRIDE],
        rsq: L,
        rinv: L,
        rinvsq: L,
        energy: bool,
    ) -> (L, L);
}

/// No van der Waals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVdw;

impl VanDerWaals for NoVdw {
    const KIND: VdwKind = VdwKind::None;
    const ACTIVE: bool = false;
    const STRIDE: usize = LJ_STRIDE;

    #[inline]
    fn pair<L: Lane>(
        &self,
        _c: &[L; MAX_STRIDE],
        _rsq: L,
        _rinv: L,
        _rinvsq: L,
        _energy: bool,
    ) -> (L, L) {
        (L::zero(), L::zero())
    }
}

/// Lennard-Jones 12-6 with a plain cutoff.
#[derive(Debug, Clone, Copy, Default)]
pub struct LennardJones;

impl VanDerWaals for LennardJones {
    const KIND: VdwKind = VdwKind::LennardJones;
    const STRIDE: usize = LJ_STRIDE;

    #[inline]
    fn pair<L: Lane>(
        &self,
        c: &[L; MAX_STRIDE],
        _rsq: L,
        _rinv: L,
        rinvsq: L,
        energy: bool,
    ) -> (L, L) {
        let rinvsix = rinvsq * rinvsq * rinvsq;
        let vvdw6 = c[0] * rinvsix;
        let vvdw12 = c[1] * rinvsix * rinvsix;
        let fvdw = (vvdw12 - vvdw6) * rinvsq;
        let vvdw = if energy {
            vvdw12 * L::splat(ONE_TWELFTH) - vvdw6 * L::splat(ONE_SIXTH)
        } else {
            L::zero()
        };
        (vvdw, fvdw)
    }
}

/// Lennard-Jones with the potential shifted to zero at the cutoff.
///
/// Only the potential is shifted; the force is that of plain Lennard-Jones.
#[derive(Debug, Clone, Copy)]
pub struct LennardJonesShift {
    /// `1/rc⁶`.
    pub sh_invrc6: f64,
}

impl LennardJonesShift {
    pub fn new(cutoff: f64) -> Self {
        Self::with_shift(cutoff.powi(-6))
    }

    /// Explicit shift constant; zero disables the shift.
    pub fn with_shift(sh_invrc6: f64) -> Self {
        Self { sh_invrc6 }
    }
}

impl VanDerWaals for LennardJonesShift {
    const KIND: VdwKind = VdwKind::LennardJonesShift;
    const STRIDE: usize = LJ_STRIDE;

    #[inline]
    fn pair<L: Lane>(
        &self,
        c: &[L; MAX_STRIDE],
        _rsq: L,
        _rinv: L,
        rinvsq: L,
        energy: bool,
    ) -> (L, L) {
        let rinvsix = rinvsq * rinvsq * rinvsq;
        let vvdw6 = c[0] * rinvsix;
        let vvdw12 = c[1] * rinvsix * rinvsix;
        let fvdw = (vvdw12 - vvdw6) * rinvsq;
        let vvdw = if energy {
            let sh6 = L::splat(self.sh_invrc6);
            (vvdw12 - c[1] * sh6 * sh6) * L::splat(ONE_TWELFTH)
                - (vvdw6 - c[0] * sh6) * L::splat(ONE_SIXTH)
        } else {
            L::zero()
        };
        (vvdw, fvdw)
    }
}

/// Buckingham exp-6: `v = A·exp(−Br) − C6/r⁶`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Buckingham;

impl VanDerWaals for Buckingham {
    const KIND: VdwKind = VdwKind::Buckingham;
    const STRIDE: usize = BHAM_STRIDE;

    #[inline]
    fn pair<L: Lane>(
        &self,
        c: &[L; MAX_STRIDE],
        rsq: L,
        rinv: L,
        rinvsq: L,
        energy: bool,
    ) -> (L, L) {
        let r = rsq * rinv;
        let rinvsix = rinvsq * rinvsq * rinvsq;
        let vvdw6 = c[0] * rinvsix;
        let br = c[2] * r;
        let vvdwexp = c[1] * (-br).map(f64::exp);
        let fvdw = (br * vvdwexp - vvdw6) * rinvsq;
        let vvdw = if energy {
            vvdwexp - vvdw6 * L::splat(ONE_SIXTH)
        } else {
            L::zero()
        };
        (vvdw, fvdw)
    }
}

/// Cubic-spline tabulated dispersion and repulsion.
#[derive(Debug, Clone)]
pub struct TabulatedVdw {
    dispersion: Arc<SplineTable>,
    repulsion: Arc<SplineTable>,
}

impl TabulatedVdw {
    pub fn new(dispersion: Arc<SplineTable>, repulsion: Arc<SplineTable>) -> Self {
        Self {
            dispersion,
            repulsion,
        }
    }

    pub fn dispersion(&self) -> &SplineTable {
        &self.dispersion
    }

    pub fn repulsion(&self) -> &SplineTable {
        &self.repulsion
    }
}

impl VanDerWaals for TabulatedVdw {
    const KIND: VdwKind = VdwKind::Tabulated;
    const STRIDE: usize = LJ_STRIDE;

    #[inline]
    fn pair<L: Lane>(
        &self,
        c: &[L; MAX_STRIDE],
        rsq: L,
        rinv: L,
        _rinvsq: L,
        energy: bool,
    ) -> (L, L) {
        let r = rsq * rinv;
        let sd = L::splat(self.dispersion.scale());
        let sr = L::splat(self.repulsion.scale());
        let (vvd, ffd) = self.dispersion.lookup_lanes(r * sd);
        let (vvr, ffr) = self.repulsion.lookup_lanes(r * sr);
        let fvdw = -((c[0] * ffd * sd + c[1] * ffr * sr) * rinv);
        let vvdw = if energy {
            c[0] * vvd + c[1] * vvr
        } else {
            L::zero()
        };
        (vvdw, fvdw)
    }
}
