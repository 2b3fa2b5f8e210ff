//! Lane reductions and per-entry commits.

use crate::geometry::MAX_SITES;
use crate::nblist::OuterEntry;
use crate::output::KernelOutput;
use nonbond_math::{Lane, LaneVec3, Vec3, add_vec3};

/// Horizontal sum of a lane force and a lane energy, folded in slot order.
#[inline]
pub fn reduce<L: Lane>(force: &LaneVec3<L>, energy: L) -> (Vec3, f64) {
    (force.reduce_add(), energy.reduce_add())
}

/// Lane accumulators of one outer entry.
///
/// Partner contributions stay in lanes for the whole entry and are reduced
/// once in [`commit`](Self::commit).
#[derive(Debug, Clone, Copy)]
pub struct OuterAccumulator<L> {
    force: [LaneVec3<L>; MAX_SITES],
    velec: L,
    vvdw: L,
    vgb: L,
    dvda: L,
}

impl<L: Lane> Default for OuterAccumulator<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lane> OuterAccumulator<L> {
    #[inline]
    pub fn new() -> Self {
        Self {
            force: [LaneVec3::zero(); MAX_SITES],
            velec: L::zero(),
            vvdw: L::zero(),
            vgb: L::zero(),
            dvda: L::zero(),
        }
    }

    #[inline]
    pub fn add_force(&mut self, site: usize, f: LaneVec3<L>) {
        self.force[site] += f;
    }

    #[inline]
    pub fn add_elec(&mut self, v: L) {
        self.velec += v;
    }

    #[inline]
    pub fn add_vdw(&mut self, v: L) {
        self.vvdw += v;
    }

    #[inline]
    pub fn add_polarization(&mut self, v: L) {
        self.vgb += v;
    }

    #[inline]
    pub fn add_dvda(&mut self, d: L) {
        self.dvda += d;
    }

    /// Reduce and write one entry's results.
    ///
    /// Adds the force on each of the `sites` outer particles, adds their sum
    /// to the entry's shift force, adds the potentials to the entry's group
    /// when `energy` is set, and adds `Σdvda · isa_i²` to the outer particle
    /// when `isa_i` is given. Returns the total outer force.
    pub fn commit(
        &self,
        entry: &OuterEntry,
        sites: usize,
        energy: bool,
        isa_i: Option<f64>,
        output: &mut KernelOutput,
    ) -> Vec3 {
        let mut total = Vec3::zeros();
        for (a, f) in self.force.iter().enumerate().take(sites) {
            let (f, _) = reduce(f, L::zero());
            add_vec3(&mut output.forces, entry.index + a, &f);
            total += f;
        }
        add_vec3(&mut output.shift_forces, entry.shift, &total);

        if energy {
            let g = entry.group;
            output.energies.elec[g] += self.velec.reduce_add();
            output.energies.vdw[g] += self.vvdw.reduce_add();
            output.energies.polarization[g] += self.vgb.reduce_add();
        }
        if let Some(isa) = isa_i {
            output.dvda[entry.index] += self.dvda.reduce_add() * isa * isa;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wide::f64x4;

    fn lane(values: [f64; 4]) -> f64x4 {
        <f64x4 as Lane>::gather(|k| values[k])
    }

    #[test]
    fn test_reduce_lane_order() {
        let f = LaneVec3 {
            x: lane([1.0, 2.0, 3.0, 4.0]),
            y: lane([0.5; 4]),
            z: lane([-1.0, 1.0, -1.0, 1.0]),
        };
        let (force, energy) = reduce(&f, lane([1e16, 1.0, -1e16, 1.0]));
        assert_eq!(force, Vec3::new(10.0, 2.0, 0.0));
        // ((1e16 + 1) − 1e16) + 1 in slot order.
        assert_eq!(energy, 1.0);
    }

    #[test]
    fn test_commit_writes_sites_and_shift() {
        let mut acc = OuterAccumulator::<f64x4>::new();
        acc.add_force(
            0,
            LaneVec3 {
                x: lane([1.0, 1.0, 0.0, 0.0]),
                y: lane([0.0; 4]),
                z: lane([0.0; 4]),
            },
        );
        acc.add_force(1, LaneVec3::splat(&Vec3::new(0.0, 0.25, 0.0)));
        acc.add_elec(lane([0.1; 4]));
        acc.add_vdw(lane([0.2, 0.0, 0.0, 0.0]));
        acc.add_dvda(lane([1.0; 4]));

        let mut out = KernelOutput::new(3, 27, 2);
        let entry = OuterEntry {
            index: 1,
            shift: 5,
            group: 1,
            range: 0..0,
        };
        let total = acc.commit(&entry, 2, true, Some(0.5), &mut out);

        assert_eq!(out.force(0), Vec3::zeros());
        assert_eq!(out.force(1), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(out.force(2), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(out.shift_force(5), total);
        assert_eq!(total, Vec3::new(2.0, 1.0, 0.0));
        assert_relative_eq!(out.energies.elec[1], 0.4, epsilon = 1e-15);
        assert_relative_eq!(out.energies.vdw[1], 0.2);
        assert_eq!(out.energies.elec[0], 0.0);
        assert_relative_eq!(out.dvda[1], 1.0);
    }

    #[test]
    fn test_commit_force_only() {
        let mut acc = OuterAccumulator::<f64>::new();
        acc.add_elec(3.0);
        acc.add_force(0, LaneVec3::splat(&Vec3::new(1.0, 0.0, 0.0)));
        let mut out = KernelOutput::new(1, 1, 1);
        let entry = OuterEntry {
            index: 0,
            shift: 0,
            group: 0,
            range: 0..0,
        };
        acc.commit(&entry, 1, false, None, &mut out);
        assert_eq!(out.energies.total(), 0.0);
        assert_eq!(out.force(0), Vec3::new(1.0, 0.0, 0.0));
    }
}
