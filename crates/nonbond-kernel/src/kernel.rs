//! The generic pair kernel.
//!
//! [`PairKernel`] is written once over five strategy parameters (the
//! electrostatics model, the van der Waals model, the site geometry, the
//! output mode and the lane type) and monomorphized per combination. The
//! loop structure is the same for all of them:
//!
//! 1. For each neighbor-list entry, load the outer sites, add the entry's
//!    shift vector, and fold the dielectric prefactor into their charges.
//! 2. Walk the partner range in lane blocks. For each interacting site pair,
//!    compute displacements, `rsq` and `1/r`, build the cutoff mask
//!    `rsq < rc²` combined with the block's active-slot mask, and evaluate
//!    the models.
//! 3. Mask force scalars and potentials, add `f · d` to the outer
//!    accumulators and subtract it from the partners at the end of the block.
//! 4. Reduce the outer accumulators once per entry and commit forces, shift
//!    force, group energies and counters.

use crate::blocking::lane_blocks;
use crate::config::{OutputKind, kernel_name};
use crate::dispatch::is_supported;
use crate::elec::{ElecPair, Electrostatics};
use crate::error::{KernelError, Result};
use crate::flops::FlopWeights;
use crate::geometry::{Geometry, MAX_SITES, site_pair};
use crate::nblist::NeighborList;
use crate::output::{KernelCounters, KernelOutput};
use crate::params::{InteractionParameterTable, ParticleParams};
use crate::reduce::OuterAccumulator;
use crate::shift::ShiftVectors;
use crate::vdw::{MAX_STRIDE, VanDerWaals};
use nonbond_math::{DIM, DefaultLane, Lane, LaneVec3, MAX_LANES, Vec3, load_vec3};
use std::marker::PhantomData;

/// Whether a kernel writes potentials.
pub trait OutputMode: Send + Sync + 'static {
    const KIND: OutputKind;
    const ENERGY: bool;
}

/// Forces only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceOnly;

impl OutputMode for ForceOnly {
    const KIND: OutputKind = OutputKind::Force;
    const ENERGY: bool = false;
}

/// Forces and potentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceAndEnergy;

impl OutputMode for ForceAndEnergy {
    const KIND: OutputKind = OutputKind::ForceEnergy;
    const ENERGY: bool = true;
}

/// Read-only per-step inputs.
#[derive(Debug, Clone, Copy)]
pub struct KernelInputs<'a> {
    /// Flat xyz coordinates.
    pub positions: &'a [f64],
    pub params: &'a ParticleParams,
    pub table: &'a InteractionParameterTable,
    pub shifts: &'a ShiftVectors,
}

impl KernelInputs<'_> {
    pub fn n_particles(&self) -> usize {
        self.positions.len() / DIM
    }
}

/// Object-safe view of any kernel instance.
pub trait NonbondedKernel: Send + Sync {
    /// `Elec<X>_Vdw<Y>_Geom<Z>_<F|VF>`.
    fn name(&self) -> String;

    fn weights(&self) -> FlopWeights;

    fn cutoff(&self) -> f64;

    /// Slots per lane block.
    fn lane_width(&self) -> usize;

    /// Check that `nlist`, `inputs` and `output` are consistent with this kernel.
    fn validate(
        &self,
        nlist: &NeighborList,
        inputs: &KernelInputs<'_>,
        output: &KernelOutput,
    ) -> Result<()>;

    /// Accumulate forces, energies and counters for every entry of `nlist`.
    ///
    /// Trusts its inputs; run [`validate`](Self::validate) first when they
    /// come from an untrusted source.
    fn evaluate(
        &self,
        nlist: &NeighborList,
        inputs: &KernelInputs<'_>,
        output: &mut KernelOutput,
        counters: &mut KernelCounters,
    );
}

/// One monomorphized kernel.
#[derive(Debug, Clone)]
pub struct PairKernel<E, V, G, O, L = DefaultLane> {
    elec: E,
    vdw: V,
    cutoff: f64,
    cutoff_sq: f64,
    weights: FlopWeights,
    _marker: PhantomData<fn() -> (G, O, L)>,
}

impl<E, V, G, O, L> PairKernel<E, V, G, O, L>
where
    E: Electrostatics,
    V: VanDerWaals,
    G: Geometry,
    O: OutputMode,
    L: Lane,
{
    pub fn new(elec: E, vdw: V, cutoff: f64) -> Result<Self> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(KernelError::InvalidConstants(format!(
                "cutoff must be positive and finite, got {cutoff}"
            )));
        }
        if !is_supported(E::KIND, V::KIND, G::KIND) {
            return Err(KernelError::UnsupportedConfiguration(kernel_name(
                E::KIND,
                V::KIND,
                G::KIND,
                O::KIND,
            )));
        }
        Ok(Self {
            elec,
            vdw,
            cutoff,
            cutoff_sq: cutoff * cutoff,
            weights: FlopWeights::for_kernel(E::KIND, V::KIND, G::KIND, O::KIND),
            _marker: PhantomData,
        })
    }

    pub fn elec(&self) -> &E {
        &self.elec
    }

    pub fn vdw(&self) -> &V {
        &self.vdw
    }

    /// Site pair `(a, b)` of one lane block.
    #[inline(always)]
    #[allow(clippy::too_many_arguments)]
    fn site_pair_block(
        &self,
        a: usize,
        ix: &Vec3,
        iq: f64,
        itype: usize,
        isa_i: f64,
        j: &PartnerSites<L>,
        b: usize,
        mask_active: L::Mask,
        inputs: &KernelInputs<'_>,
        acc: &mut OuterAccumulator<L>,
        fj: &mut LaneVec3<L>,
        dvda_j: &mut L,
    ) {
        let pair = site_pair(&G::I, &G::J, a, b, E::ACTIVE, V::ACTIVE);
        let d = LaneVec3::splat(ix) - j.x[b];
        let rsq = d.norm_squared();
        let mask = rsq.less_than(L::splat(self.cutoff_sq)) & mask_active;
        if !L::any(mask) {
            return;
        }
        let rinv = L::splat(1.0) / rsq.sqrt();
        let rinvsq = rinv * rinv;
        let mut fscal = L::zero();

        if pair.elec {
            let p = ElecPair {
                qq: L::splat(iq) * j.q[b],
                rsq,
                rinv,
                rinvsq,
                isa_i: L::splat(isa_i),
                isa_j: j.isa[b],
            };
            let t = self.elec.pair(&p, O::ENERGY);
            fscal += t.felec;
            if O::ENERGY {
                acc.add_elec(t.velec.masked(mask));
                if E::BORN_RADII {
                    acc.add_polarization(t.vgb.masked(mask));
                }
            }
            if E::BORN_RADII {
                let dvda = t.dvda.masked(mask);
                acc.add_dvda(dvda);
                *dvda_j += dvda * j.isa[b] * j.isa[b];
            }
        }

        if pair.vdw {
            let table = inputs.table;
            let mut c = [L::zero(); MAX_STRIDE];
            for (m, slot) in c.iter_mut().enumerate().take(V::STRIDE) {
                *slot = L::gather(|k| table.coeff(itype, j.types[b][k], m));
            }
            let (vvdw, fvdw) = self.vdw.pair(&c, rsq, rinv, rinvsq, O::ENERGY);
            fscal += fvdw;
            if O::ENERGY {
                acc.add_vdw(vvdw.masked(mask));
            }
        }

        let f = d.scale(fscal.masked(mask));
        acc.add_force(a, f);
        *fj += f;
    }
}

/// Partner-site data gathered once per lane block.
struct PartnerSites<L> {
    x: [LaneVec3<L>; MAX_SITES],
    q: [L; MAX_SITES],
    isa: [L; MAX_SITES],
    types: [[usize; MAX_LANES]; MAX_SITES],
}

impl<E, V, G, O, L> NonbondedKernel for PairKernel<E, V, G, O, L>
where
    E: Electrostatics,
    V: VanDerWaals,
    G: Geometry,
    O: OutputMode,
    L: Lane,
{
    fn name(&self) -> String {
        kernel_name(E::KIND, V::KIND, G::KIND, O::KIND)
    }

    fn weights(&self) -> FlopWeights {
        self.weights
    }

    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn lane_width(&self) -> usize {
        L::WIDTH
    }

    fn validate(
        &self,
        nlist: &NeighborList,
        inputs: &KernelInputs<'_>,
        output: &KernelOutput,
    ) -> Result<()> {
        if inputs.positions.len() % DIM != 0 {
            return Err(KernelError::InvalidParameters(format!(
                "position array of length {} is not a multiple of {}",
                inputs.positions.len(),
                DIM
            )));
        }
        let n = inputs.n_particles();
        nlist.validate(
            n,
            inputs.shifts.len(),
            output.energies.len(),
            G::I.sites,
            G::J.sites,
        )?;
        inputs.params.validate(n, inputs.table.ntype())?;
        if V::ACTIVE && inputs.table.stride() != V::STRIDE {
            return Err(KernelError::InvalidParameters(format!(
                "{} needs {} coefficients per type pair, table has {}",
                self.name(),
                V::STRIDE,
                inputs.table.stride()
            )));
        }
        if E::BORN_RADII && inputs.params.inv_sqrt_born_radii.is_none() {
            return Err(KernelError::InvalidParameters(format!(
                "{} needs Born radii",
                self.name()
            )));
        }
        if output.n_particles() != n || output.dvda.len() != n {
            return Err(KernelError::InvalidParameters(format!(
                "output sized for {} particles, inputs have {}",
                output.n_particles(),
                n
            )));
        }
        if output.n_shifts() != inputs.shifts.len() {
            return Err(KernelError::InvalidParameters(format!(
                "output has {} shift forces for {} shift vectors",
                output.n_shifts(),
                inputs.shifts.len()
            )));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        nlist: &NeighborList,
        inputs: &KernelInputs<'_>,
        output: &mut KernelOutput,
        counters: &mut KernelCounters,
    ) {
        let x = inputs.positions;
        let charges = &inputs.params.charges;
        let types = &inputs.params.vdw_types;
        let isa = inputs.params.inv_sqrt_born_radii.as_deref().unwrap_or(&[]);
        let epsfac = self.elec.epsfac();
        let partners = nlist.partners();
        let mut inner = 0u64;

        for entry in nlist.entries() {
            let shift = inputs.shifts.get(entry.shift);
            let mut ix = [Vec3::zeros(); MAX_SITES];
            let mut iq = [0.0; MAX_SITES];
            let mut itype = [0usize; MAX_SITES];
            for a in 0..G::I.sites {
                let i = entry.index + a;
                ix[a] = load_vec3(x, i) + shift;
                if E::ACTIVE && G::I.charged[a] {
                    iq[a] = epsfac * charges[i];
                }
                if V::ACTIVE && G::I.vdw[a] {
                    itype[a] = types[i];
                }
            }
            let isa_i = if E::BORN_RADII { isa[entry.index] } else { 0.0 };

            let mut acc = OuterAccumulator::<L>::new();
            for block in lane_blocks(entry.range.start, entry.range.end, L::WIDTH) {
                let jidx = block.indices(partners);
                let active = L::first_n(block.active);

                let mut j = PartnerSites {
                    x: [LaneVec3::zero(); MAX_SITES],
                    q: [L::zero(); MAX_SITES],
                    isa: [L::zero(); MAX_SITES],
                    types: [[0; MAX_LANES]; MAX_SITES],
                };
                for b in 0..G::J.sites {
                    j.x[b] = LaneVec3::gather(x, |k| jidx[k] + b);
                    if E::ACTIVE && G::J.charged[b] {
                        j.q[b] = L::gather(|k| charges[jidx[k] + b]);
                        if E::BORN_RADII {
                            j.isa[b] = L::gather(|k| isa[jidx[k] + b]);
                        }
                    }
                    if V::ACTIVE && G::J.vdw[b] {
                        for k in 0..L::WIDTH {
                            j.types[b][k] = types[jidx[k] + b];
                        }
                    }
                }

                let mut fj = [LaneVec3::<L>::zero(); MAX_SITES];
                let mut dvda_j = [L::zero(); MAX_SITES];
                for a in 0..G::I.sites {
                    for b in 0..G::J.sites {
                        if !site_pair(&G::I, &G::J, a, b, E::ACTIVE, V::ACTIVE).any() {
                            continue;
                        }
                        self.site_pair_block(
                            a,
                            &ix[a],
                            iq[a],
                            itype[a],
                            isa_i,
                            &j,
                            b,
                            active,
                            inputs,
                            &mut acc,
                            &mut fj[b],
                            &mut dvda_j[b],
                        );
                    }
                }

                for b in 0..G::J.sites {
                    for (k, &jk) in jidx.iter().enumerate().take(block.active) {
                        let o = DIM * (jk + b);
                        output.forces[o] -= fj[b].x.extract(k);
                        output.forces[o + 1] -= fj[b].y.extract(k);
                        output.forces[o + 2] -= fj[b].z.extract(k);
                        if E::BORN_RADII {
                            output.dvda[jk + b] += dvda_j[b].extract(k);
                        }
                    }
                }
            }

            let born = E::BORN_RADII.then_some(isa_i);
            acc.commit(&entry, G::I.sites, O::ENERGY, born, output);
            inner += entry.range.len() as u64;
        }

        counters.record(nlist.len() as u64, inner, &self.weights);
        log::trace!(
            "{}: {} outer, {} inner iterations",
            self.name(),
            nlist.len(),
            inner
        );
    }
}
