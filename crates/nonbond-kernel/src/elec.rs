//! Electrostatics models.
//!
//! Every model returns the pair potential `velec` and the force scalar
//! `felec`, defined so that the force on the outer particle is
//! `felec · (x_i − x_j)`. Charges reach the models already multiplied by the
//! dielectric prefactor.

use crate::config::{ElectrostaticsKind, InteractionConstants};
use crate::error::{KernelError, Result};
use crate::table::SplineTable;
use nonbond_math::Lane;
use statrs::function::erf::erfc;
use std::f64::consts::PI;
use std::sync::Arc;

/// Per-lane inputs of one site pair.
#[derive(Clone, Copy, Debug)]
pub struct ElecPair<L> {
    /// Product of the (prefactored) charges.
    pub qq: L,
    pub rsq: L,
    pub rinv: L,
    pub rinvsq: L,
    /// `1/sqrt(born_radius)` of the outer site.
    pub isa_i: L,
    /// `1/sqrt(born_radius)` of the partner site.
    pub isa_j: L,
}

/// Per-lane outputs of one site pair.
#[derive(Clone, Copy, Debug)]
pub struct ElecTerms<L> {
    pub velec: L,
    pub felec: L,
    /// Generalized Born polarization energy.
    pub vgb: L,
    /// Generalized Born chain-rule term, before the `isa²` weight.
    pub dvda: L,
}

impl<L: Lane> ElecTerms<L> {
    #[inline]
    fn plain(velec: L, felec: L) -> Self {
        Self {
            velec,
            felec,
            vgb: L::zero(),
            dvda: L::zero(),
        }
    }
}

/// An electrostatics model evaluated on lanes.
pub trait Electrostatics: Send + Sync + 'static {
    const KIND: ElectrostaticsKind;
    /// False only for the model without electrostatics; the kernel then skips charges.
    const ACTIVE: bool = true;
    /// True when the model reads Born radii and writes `dvda`.
    const BORN_RADII: bool = false;

    /// Factor applied to each outer charge.
    fn epsfac(&self) -> f64;

    /// Potential and force scalar; `velec`/`vgb` are only meaningful when `energy` is set.
    fn pair<L: Lane>(&self, p: &ElecPair<L>, energy: bool) -> ElecTerms<L>;
}

/// No electrostatics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElectrostatics;

impl Electrostatics for NoElectrostatics {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::None;
    const ACTIVE: bool = false;

    fn epsfac(&self) -> f64 {
        0.0
    }

    #[inline]
    fn pair<L: Lane>(&self, _p: &ElecPair<L>, _energy: bool) -> ElecTerms<L> {
        ElecTerms::plain(L::zero(), L::zero())
    }
}

/// Plain Coulomb: `v = qq/r`, `f = qq/r³`.
#[derive(Debug, Clone, Copy)]
pub struct Coulomb {
    pub epsfac: f64,
}

impl Coulomb {
    pub fn new(epsfac: f64) -> Self {
        Self { epsfac }
    }
}

impl Electrostatics for Coulomb {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::Coulomb;

    fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    fn pair<L: Lane>(&self, p: &ElecPair<L>, _energy: bool) -> ElecTerms<L> {
        let velec = p.qq * p.rinv;
        ElecTerms::plain(velec, velec * p.rinvsq)
    }
}

/// Reaction field: `v = qq(1/r + k_rf r² − c_rf)`, `f = qq(1/r³ − 2k_rf)`.
#[derive(Debug, Clone, Copy)]
pub struct ReactionField {
    pub epsfac: f64,
    pub k_rf: f64,
    pub c_rf: f64,
}

impl ReactionField {
    pub fn new(epsfac: f64, k_rf: f64, c_rf: f64) -> Self {
        Self { epsfac, k_rf, c_rf }
    }

    /// Constants from the cutoff and dielectrics (or their explicit overrides).
    pub fn from_constants(constants: &InteractionConstants) -> Self {
        let (k_rf, c_rf) = constants.reaction_field();
        Self::new(constants.epsfac(), k_rf, c_rf)
    }
}

impl Electrostatics for ReactionField {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::ReactionField;

    fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    fn pair<L: Lane>(&self, p: &ElecPair<L>, energy: bool) -> ElecTerms<L> {
        let krf = L::splat(self.k_rf);
        let felec = p.qq * (p.rinv * p.rinvsq - L::splat(2.0) * krf);
        let velec = if energy {
            p.qq * (p.rinv + krf * p.rsq - L::splat(self.c_rf))
        } else {
            L::zero()
        };
        ElecTerms::plain(velec, felec)
    }
}

/// Splitting coefficient β such that `erfc(β · cutoff) ≈ rtol`.
///
/// Doubles β until the tolerance is met, then bisects.
pub fn ewald_coefficient(cutoff: f64, rtol: f64) -> Result<f64> {
    if !(cutoff.is_finite() && cutoff > 0.0) || !(rtol > 0.0 && rtol < 1.0) {
        return Err(KernelError::InvalidConstants(format!(
            "no Ewald coefficient for cutoff {cutoff} and tolerance {rtol}"
        )));
    }
    let mut beta = 5.0;
    let mut doublings = 0;
    loop {
        doublings += 1;
        beta *= 2.0;
        if erfc(beta * cutoff) <= rtol {
            break;
        }
    }

    let mut low = 0.0;
    let mut high = beta;
    for _ in 0..doublings + 60 {
        beta = 0.5 * (low + high);
        if erfc(beta * cutoff) > rtol {
            low = beta;
        } else {
            high = beta;
        }
    }
    Ok(beta)
}

#[inline]
fn ewald_terms<L: Lane>(p: &ElecPair<L>, beta: f64) -> (L, L) {
    let r = p.rsq * p.rinv;
    let br = L::splat(beta) * r;
    let erfc_br = br.map(erfc);
    let gauss = (-(br * br)).map(f64::exp);
    let vcore = erfc_br * p.rinv;
    let fcore = (vcore + L::splat(2.0 * beta / PI.sqrt()) * gauss) * p.rinvsq;
    (p.qq * vcore, p.qq * fcore)
}

/// Ewald real-space term with a plain cutoff.
#[derive(Debug, Clone, Copy)]
pub struct Ewald {
    pub epsfac: f64,
    pub beta: f64,
}

impl Ewald {
    pub fn new(epsfac: f64, beta: f64) -> Self {
        Self { epsfac, beta }
    }

    pub fn from_constants(constants: &InteractionConstants) -> Result<Self> {
        Ok(Self::new(constants.epsfac(), constants.ewald_coefficient()?))
    }
}

impl Electrostatics for Ewald {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::Ewald;

    fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    fn pair<L: Lane>(&self, p: &ElecPair<L>, _energy: bool) -> ElecTerms<L> {
        let (velec, felec) = ewald_terms(p, self.beta);
        ElecTerms::plain(velec, felec)
    }
}

/// Ewald real-space term with the potential shifted to zero at the cutoff.
#[derive(Debug, Clone, Copy)]
pub struct EwaldShift {
    pub epsfac: f64,
    pub beta: f64,
    /// `erfc(β rc)/rc`.
    pub sh_ewald: f64,
}

impl EwaldShift {
    pub fn new(epsfac: f64, beta: f64, cutoff: f64) -> Self {
        Self {
            epsfac,
            beta,
            sh_ewald: erfc(beta * cutoff) / cutoff,
        }
    }

    pub fn from_constants(constants: &InteractionConstants) -> Result<Self> {
        Ok(Self::new(
            constants.epsfac(),
            constants.ewald_coefficient()?,
            constants.cutoff,
        ))
    }
}

impl Electrostatics for EwaldShift {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::EwaldShift;

    fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    fn pair<L: Lane>(&self, p: &ElecPair<L>, energy: bool) -> ElecTerms<L> {
        let (velec, felec) = ewald_terms(p, self.beta);
        let velec = if energy {
            velec - p.qq * L::splat(self.sh_ewald)
        } else {
            velec
        };
        ElecTerms::plain(velec, felec)
    }
}

/// Generalized Born polarization plus plain Coulomb.
///
/// Born radii enter as `isa = 1/sqrt(a)`; the screening function is read from
/// a table of `1/sqrt(x² + exp(−x²/4))` in the scaled distance
/// `x = r · isa_i · isa_j`.
#[derive(Debug, Clone)]
pub struct GeneralizedBorn {
    pub epsfac: f64,
    /// `1/ε_r − 1/ε_solvent`.
    pub inv_eps_diff: f64,
    table: Arc<SplineTable>,
}

impl GeneralizedBorn {
    pub fn new(epsfac: f64, epsilon_r: f64, epsilon_solvent: f64, table: Arc<SplineTable>) -> Self {
        Self {
            epsfac,
            inv_eps_diff: 1.0 / epsilon_r - 1.0 / epsilon_solvent,
            table,
        }
    }

    pub fn table(&self) -> &SplineTable {
        &self.table
    }
}

impl Electrostatics for GeneralizedBorn {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::GeneralizedBorn;
    const BORN_RADII: bool = true;

    fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    fn pair<L: Lane>(&self, p: &ElecPair<L>, _energy: bool) -> ElecTerms<L> {
        let r = p.rsq * p.rinv;
        let isaprod = p.isa_i * p.isa_j;
        let gbqq = L::splat(-self.inv_eps_diff) * p.qq * isaprod;
        let gbscale = isaprod * L::splat(self.table.scale());
        let (vv, ff) = self.table.lookup_lanes(r * gbscale);
        let vgb = gbqq * vv;
        let fgb = gbqq * ff * gbscale;
        let dvda = L::splat(-0.5) * (vgb + fgb * r);

        let velec = p.qq * p.rinv;
        let felec = (velec * p.rinv - fgb) * p.rinv;
        ElecTerms {
            velec,
            felec,
            vgb,
            dvda,
        }
    }
}

/// Cubic-spline tabulated electrostatics: `v = qq · VV`, `f = −qq · FF · scale / r`.
#[derive(Debug, Clone)]
pub struct TabulatedElectrostatics {
    pub epsfac: f64,
    table: Arc<SplineTable>,
}

impl TabulatedElectrostatics {
    pub fn new(epsfac: f64, table: Arc<SplineTable>) -> Self {
        Self { epsfac, table }
    }

    pub fn table(&self) -> &SplineTable {
        &self.table
    }
}

impl Electrostatics for TabulatedElectrostatics {
    const KIND: ElectrostaticsKind = ElectrostaticsKind::Tabulated;

    fn epsfac(&self) -> f64 {
        self.epsfac
    }

    #[inline]
    fn pair<L: Lane>(&self, p: &ElecPair<L>, _energy: bool) -> ElecTerms<L> {
        let scale = L::splat(self.table.scale());
        let r = p.rsq * p.rinv;
        let (vv, ff) = self.table.lookup_lanes(r * scale);
        let velec = p.qq * vv;
        let felec = -(p.qq * ff * scale * p.rinv);
        ElecTerms::plain(velec, felec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scalar_pair(qq: f64, r: f64) -> ElecPair<f64> {
        ElecPair {
            qq,
            rsq: r * r,
            rinv: 1.0 / r,
            rinvsq: 1.0 / (r * r),
            isa_i: 1.0,
            isa_j: 1.0,
        }
    }

    /// Energy derivative against the force scalar: `f · r = −dV/dr`.
    /// `h` stays well above the rounding noise of the `erfc` evaluations.
    fn check_gradient<E: Electrostatics>(model: &E, qq: f64, r: f64) {
        let h = 1e-4;
        let v = |r: f64| model.pair(&scalar_pair(qq, r), true).velec;
        let dvdr = (v(r + h) - v(r - h)) / (2.0 * h);
        let f = model.pair(&scalar_pair(qq, r), true).felec;
        assert_relative_eq!(f * r, -dvdr, max_relative = 1e-6, epsilon = 1e-8);
    }

    #[test]
    fn test_reaction_field_scenario() {
        let rf = ReactionField::new(1.0, 0.1, 0.5);
        let t = rf.pair(&scalar_pair(1.0, 1.0), true);
        assert_relative_eq!(t.velec, 0.6, epsilon = 1e-12);
        assert_relative_eq!(t.felec, 0.8, epsilon = 1e-12);
        assert_eq!(t.vgb, 0.0);
    }

    #[test]
    fn test_reaction_field_force_only() {
        let rf = ReactionField::new(1.0, 0.1, 0.5);
        let t = rf.pair(&scalar_pair(1.0, 1.0), false);
        assert_eq!(t.velec, 0.0);
        assert_relative_eq!(t.felec, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_reaction_field_zero_at_cutoff() {
        let c = InteractionConstants::with_cutoff(1.2);
        let rf = ReactionField::from_constants(&c);
        let t = rf.pair(&scalar_pair(1.0, 1.2), true);
        assert_relative_eq!(t.velec, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coulomb() {
        let t = Coulomb::new(1.0).pair(&scalar_pair(2.0, 0.5), true);
        assert_relative_eq!(t.velec, 4.0);
        assert_relative_eq!(t.felec, 16.0);
        check_gradient(&Coulomb::new(1.0), -1.5, 0.7);
    }

    #[test]
    fn test_ewald_coefficient() {
        let beta = ewald_coefficient(0.9, 1e-5).unwrap();
        assert_relative_eq!(erfc(beta * 0.9), 1e-5, max_relative = 1e-6);
        // GROMACS reports β ≈ 3.47 nm⁻¹ for rc = 0.9 nm, rtol = 1e-5.
        assert!((beta - 3.47).abs() < 0.01);
        assert!(ewald_coefficient(0.0, 1e-5).is_err());
        assert!(ewald_coefficient(1.0, 1.0).is_err());
    }

    #[test]
    fn test_ewald_gradient() {
        check_gradient(&Ewald::new(1.0, 3.0), 1.0, 0.4);
        check_gradient(&EwaldShift::new(1.0, 3.0, 1.0), -0.8, 0.75);
    }

    #[test]
    fn test_ewald_shift_zero_at_cutoff() {
        let ew = EwaldShift::new(1.0, 2.5, 1.0);
        let t = ew.pair(&scalar_pair(1.0, 1.0), true);
        assert_relative_eq!(t.velec, 0.0, epsilon = 1e-14);
        let plain = Ewald::new(1.0, 2.5).pair(&scalar_pair(1.0, 1.0), true);
        assert_relative_eq!(plain.felec, t.felec);
    }

    #[test]
    fn test_tabulated_matches_coulomb() {
        let table = Arc::new(SplineTable::coulomb(2000.0, 2.0).unwrap());
        let tab = TabulatedElectrostatics::new(1.0, table);
        let exact = Coulomb::new(1.0);
        for &r in &[0.3, 0.55, 0.91, 1.4] {
            let a = tab.pair(&scalar_pair(0.7, r), true);
            let b = exact.pair(&scalar_pair(0.7, r), true);
            assert_relative_eq!(a.velec, b.velec, max_relative = 1e-8);
            assert_relative_eq!(a.felec, b.felec, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_generalized_born_terms() {
        let table = Arc::new(SplineTable::generalized_born(500.0, 100.0).unwrap());
        let gb = GeneralizedBorn::new(1.0, 1.0, 80.0, table);
        let p = ElecPair {
            qq: 1.0,
            rsq: 0.25,
            rinv: 2.0,
            rinvsq: 4.0,
            isa_i: 1.0 / 0.2_f64.sqrt(),
            isa_j: 1.0 / 0.3_f64.sqrt(),
        };
        let t = gb.pair(&p, true);

        // Still energy −qq (1 − 1/80) / f_GB with
        // f_GB = sqrt(r² + a_i a_j exp(−r² / (4 a_i a_j))).
        let aiaj: f64 = 0.2 * 0.3;
        let f_gb = (0.25 + aiaj * (-0.25 / (4.0 * aiaj)).exp()).sqrt();
        assert_relative_eq!(t.vgb, -(1.0 - 1.0 / 80.0) / f_gb, max_relative = 1e-6);
        assert_relative_eq!(t.velec, 2.0);

        // dvda = −(vgb + r · dvgb/dr)/2.
        let fd = |r: f64| {
            let q = ElecPair {
                rsq: r * r,
                rinv: 1.0 / r,
                rinvsq: 1.0 / (r * r),
                ..p
            };
            gb.pair(&q, true).vgb
        };
        let h = 1e-6;
        let dvgb = (fd(0.5 + h) - fd(0.5 - h)) / (2.0 * h);
        assert_relative_eq!(t.dvda, -0.5 * (t.vgb + dvgb * 0.5), max_relative = 1e-4);
        // Total force scalar is −d(velec + vgb)/dr / r.
        assert_relative_eq!(t.felec * 0.5, 1.0 / 0.25 - dvgb, max_relative = 1e-4);
    }

    #[test]
    fn test_no_electrostatics() {
        let t = NoElectrostatics.pair(&scalar_pair(1.0, 1.0), true);
        assert_eq!(t.velec, 0.0);
        assert_eq!(t.felec, 0.0);
        assert!(!NoElectrostatics::ACTIVE);
    }
}
