//! Parallel evaluation over disjoint neighbor-list partitions.
//!
//! Every rayon worker accumulates into a private, zeroed [`KernelOutput`] and
//! [`KernelCounters`]; the worker buffers are reduced pairwise and merged
//! into the caller's output once at the end. Kernels themselves never
//! synchronize.

use crate::error::Result;
use crate::kernel::{KernelInputs, NonbondedKernel};
use crate::nblist::NeighborList;
use crate::output::{KernelCounters, KernelOutput};
use rayon::prelude::*;

/// Evaluate `partitions` in parallel and add the results to `output` and `counters`.
///
/// Results match serial evaluation of the same partitions up to summation
/// order.
pub fn evaluate_partitions(
    kernel: &dyn NonbondedKernel,
    partitions: &[NeighborList],
    inputs: &KernelInputs<'_>,
    output: &mut KernelOutput,
    counters: &mut KernelCounters,
) {
    let template = output.zeroed_like();
    let (partial, partial_counters) = partitions
        .par_iter()
        .fold(
            || (template.clone(), KernelCounters::default()),
            |(mut out, mut cnt), nlist| {
                kernel.evaluate(nlist, inputs, &mut out, &mut cnt);
                (out, cnt)
            },
        )
        .reduce(
            || (template.clone(), KernelCounters::default()),
            |(mut a, mut ca), (b, cb)| {
                a.merge(&b);
                ca.merge(&cb);
                (a, ca)
            },
        );
    output.merge(&partial);
    counters.merge(&partial_counters);
    log::trace!(
        "{}: {} partitions on {} threads",
        kernel.name(),
        partitions.len(),
        rayon::current_num_threads()
    );
}

/// Validate every partition against `kernel`.
pub fn validate_partitions(
    kernel: &dyn NonbondedKernel,
    partitions: &[NeighborList],
    inputs: &KernelInputs<'_>,
    output: &KernelOutput,
) -> Result<()> {
    partitions
        .iter()
        .try_for_each(|nlist| kernel.validate(nlist, inputs, output))
}

/// Split `nlist` into one partition per rayon thread and evaluate them.
pub fn evaluate_parallel(
    kernel: &dyn NonbondedKernel,
    nlist: &NeighborList,
    inputs: &KernelInputs<'_>,
    output: &mut KernelOutput,
    counters: &mut KernelCounters,
) {
    let partitions = nlist.partition(rayon::current_num_threads());
    evaluate_partitions(kernel, &partitions, inputs, output, counters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElectrostaticsKind, GeometryKind, KernelConfig, OutputKind, VdwKind};
    use crate::dispatch::select_kernel;
    use crate::nblist::NeighborListBuilder;
    use crate::params::{InteractionParameterTable, ParticleParams};
    use crate::shift::ShiftVectors;
    use approx::assert_relative_eq;

    /// Particles on a jittered cubic grid with an all-pairs half list.
    fn lattice(n_side: usize) -> (Vec<f64>, ParticleParams, NeighborList) {
        let mut x = Vec::new();
        let mut q = Vec::new();
        let mut types = Vec::new();
        for i in 0..n_side {
            for j in 0..n_side {
                for k in 0..n_side {
                    let id = (i * n_side + j) * n_side + k;
                    let jitter = 0.01 * ((id * 7 % 5) as f64 - 2.0);
                    x.extend_from_slice(&[
                        0.35 * i as f64 + jitter,
                        0.35 * j as f64,
                        0.35 * k as f64 - jitter,
                    ]);
                    q.push(if id % 2 == 0 { 0.5 } else { -0.5 });
                    types.push(id % 2);
                }
            }
        }
        let n = q.len();
        let mut b = NeighborListBuilder::new();
        for i in 0..n {
            let partners: Vec<usize> = (i + 1..n).collect();
            b.push(i, 0, i % 2, &partners);
        }
        (x, ParticleParams::new(q, types), b.build())
    }

    #[test]
    fn test_partitions_match_serial() {
        let (x, params, nlist) = lattice(4);
        let table = InteractionParameterTable::from_sigma_epsilon(&[0.3, 0.32], &[0.5, 0.6])
            .unwrap();
        let shifts = ShiftVectors::none();
        let inputs = KernelInputs {
            positions: &x,
            params: &params,
            table: &table,
            shifts: &shifts,
        };
        let config = KernelConfig::new(
            ElectrostaticsKind::ReactionField,
            VdwKind::LennardJones,
            GeometryKind::ParticleParticle,
            OutputKind::ForceEnergy,
        );
        let kernel = select_kernel(&config).unwrap();

        let mut serial = KernelOutput::new(params.len(), 1, 2);
        let mut serial_counters = KernelCounters::default();
        kernel.validate(&nlist, &inputs, &serial).unwrap();
        kernel.evaluate(&nlist, &inputs, &mut serial, &mut serial_counters);

        let parts = nlist.partition(5);
        assert!(parts.len() > 1);
        let mut par = KernelOutput::new(params.len(), 1, 2);
        let mut par_counters = KernelCounters::default();
        validate_partitions(kernel.as_ref(), &parts, &inputs, &par).unwrap();
        evaluate_partitions(kernel.as_ref(), &parts, &inputs, &mut par, &mut par_counters);

        assert_eq!(par_counters, serial_counters);
        for (a, b) in [
            (&par.energies.elec, &serial.energies.elec),
            (&par.energies.vdw, &serial.energies.vdw),
        ] {
            for g in 0..2 {
                assert_relative_eq!(a[g], b[g], epsilon = 1e-9, max_relative = 1e-10);
            }
        }
        for (a, b) in par.forces.iter().zip(&serial.forces) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_parallel_adds_to_existing_output() {
        let (x, params, nlist) = lattice(3);
        let table = InteractionParameterTable::empty(2, 2);
        let shifts = ShiftVectors::none();
        let inputs = KernelInputs {
            positions: &x,
            params: &params,
            table: &table,
            shifts: &shifts,
        };
        let config = KernelConfig::new(
            ElectrostaticsKind::Coulomb,
            VdwKind::None,
            GeometryKind::ParticleParticle,
            OutputKind::ForceEnergy,
        );
        let kernel = select_kernel(&config).unwrap();

        let mut once = KernelOutput::new(params.len(), 1, 2);
        let mut counters = KernelCounters::default();
        evaluate_parallel(kernel.as_ref(), &nlist, &inputs, &mut once, &mut counters);
        let mut twice = once.clone();
        evaluate_parallel(kernel.as_ref(), &nlist, &inputs, &mut twice, &mut counters);

        assert_eq!(counters.outer_iterations, 2 * nlist.len() as u64);
        assert_relative_eq!(
            twice.energies.total(),
            2.0 * once.energies.total(),
            epsilon = 1e-9,
            max_relative = 1e-12
        );
        assert_relative_eq!(twice.net_force().norm(), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_empty_partitions() {
        let (x, params, _) = lattice(2);
        let table = InteractionParameterTable::empty(2, 2);
        let shifts = ShiftVectors::none();
        let inputs = KernelInputs {
            positions: &x,
            params: &params,
            table: &table,
            shifts: &shifts,
        };
        let config = KernelConfig::new(
            ElectrostaticsKind::Coulomb,
            VdwKind::None,
            GeometryKind::ParticleParticle,
            OutputKind::Force,
        );
        let kernel = select_kernel(&config).unwrap();
        let mut out = KernelOutput::new(params.len(), 1, 2);
        let mut counters = KernelCounters::default();
        evaluate_partitions(kernel.as_ref(), &[], &inputs, &mut out, &mut counters);
        assert_eq!(out, KernelOutput::new(params.len(), 1, 2));
        assert_eq!(counters, KernelCounters::default());
    }
}
