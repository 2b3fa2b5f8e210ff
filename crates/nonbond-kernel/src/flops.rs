//! Floating-point operation weights per kernel.
//!
//! A kernel's cost is `outer · outer_iterations + inner · inner_iterations`.
//! Inner weights sum a fixed per-site-pair cost (displacement, distance,
//! force update) with the cost of each model on every site pair it touches.
//! Outer weights charge per outer site plus one per energy term written.

use crate::config::{ElectrostaticsKind, GeometryKind, OutputKind, VdwKind};
use crate::geometry::site_pair;

/// Displacement, `rsq`, `1/r`, masking and the force update of one site pair.
const SITE_PAIR: u64 = 14;
/// Shift, load and store of one outer site.
const OUTER_SITE: u64 = 6;

fn elec_cost(kind: ElectrostaticsKind, energy: bool) -> u64 {
    use ElectrostaticsKind as E;
    let (vf, f) = match kind {
        E::None => (0, 0),
        E::Coulomb => (5, 3),
        E::ReactionField => (14, 10),
        E::Ewald => (25, 21),
        E::EwaldShift => (26, 21),
        E::GeneralizedBorn => (40, 36),
        E::Tabulated => (18, 14),
    };
    if energy { vf } else { f }
}

fn vdw_cost(kind: VdwKind, energy: bool) -> u64 {
    use VdwKind as V;
    let (vf, f) = match kind {
        V::None => (0, 0),
        V::LennardJones => (27, 19),
        V::LennardJonesShift => (30, 19),
        V::Buckingham => (35, 27),
        V::Tabulated => (30, 22),
    };
    if energy { vf } else { f }
}

/// Operation weights of one kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlopWeights {
    /// Per outer-loop iteration.
    pub outer: u64,
    /// Per inner-loop iteration (one partner).
    pub inner: u64,
}

impl FlopWeights {
    pub fn for_kernel(
        elec: ElectrostaticsKind,
        vdw: VdwKind,
        geometry: GeometryKind,
        output: OutputKind,
    ) -> Self {
        let energy = output == OutputKind::ForceEnergy;
        let elec_on = elec != ElectrostaticsKind::None;
        let vdw_on = vdw != VdwKind::None;
        let (i, j) = geometry.layouts();

        let mut inner = 0;
        for a in 0..i.sites {
            for b in 0..j.sites {
                let p = site_pair(&i, &j, a, b, elec_on, vdw_on);
                if p.any() {
                    inner += SITE_PAIR;
                }
                if p.elec {
                    inner += elec_cost(elec, energy);
                }
                if p.vdw {
                    inner += vdw_cost(vdw, energy);
                }
            }
        }

        let mut outer = OUTER_SITE * i.sites as u64;
        if energy {
            outer += u64::from(elec_on) + u64::from(vdw_on);
            if elec == ElectrostaticsKind::GeneralizedBorn {
                outer += 1;
            }
        }
        Self { outer, inner }
    }

    /// Cost of `outer` and `inner` iterations.
    pub fn cost(&self, outer: u64, inner: u64) -> u64 {
        self.outer * outer + self.inner * inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lj_shift_particle_weights() {
        let vf = FlopWeights::for_kernel(
            ElectrostaticsKind::None,
            VdwKind::LennardJonesShift,
            GeometryKind::ParticleParticle,
            OutputKind::ForceEnergy,
        );
        assert_eq!(vf, FlopWeights { outer: 7, inner: 44 });
        let f = FlopWeights::for_kernel(
            ElectrostaticsKind::None,
            VdwKind::LennardJonesShift,
            GeometryKind::ParticleParticle,
            OutputKind::Force,
        );
        assert_eq!(f, FlopWeights { outer: 6, inner: 33 });
    }

    #[test]
    fn test_rf_water_weights() {
        let vf = FlopWeights::for_kernel(
            ElectrostaticsKind::ReactionField,
            VdwKind::LennardJones,
            GeometryKind::Water3Particle,
            OutputKind::ForceEnergy,
        );
        assert_eq!(vf, FlopWeights { outer: 20, inner: 111 });
        let f = FlopWeights::for_kernel(
            ElectrostaticsKind::ReactionField,
            VdwKind::LennardJones,
            GeometryKind::Water3Particle,
            OutputKind::Force,
        );
        assert_eq!(f, FlopWeights { outer: 18, inner: 91 });
    }

    #[test]
    fn test_cost() {
        let w = FlopWeights { outer: 7, inner: 44 };
        assert_eq!(w.cost(2, 10), 14 + 440);
    }

    #[test]
    fn test_energy_never_cheaper() {
        for e in ElectrostaticsKind::ALL {
            for v in VdwKind::ALL {
                for g in GeometryKind::ALL {
                    let vf = FlopWeights::for_kernel(e, v, g, OutputKind::ForceEnergy);
                    let f = FlopWeights::for_kernel(e, v, g, OutputKind::Force);
                    assert!(vf.inner >= f.inner && vf.outer >= f.outer);
                }
            }
        }
    }
}
