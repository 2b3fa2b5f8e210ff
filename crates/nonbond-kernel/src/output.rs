//! Caller-owned kernel outputs and counters.

use crate::flops::FlopWeights;
use nonbond_math::{DIM, Vec3, load_vec3};

/// Potential-energy sums indexed by energy group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyGroups {
    pub elec: Vec<f64>,
    pub vdw: Vec<f64>,
    /// Generalized Born polarization energy.
    pub polarization: Vec<f64>,
}

impl EnergyGroups {
    pub fn new(n_groups: usize) -> Self {
        Self {
            elec: vec![0.0; n_groups],
            vdw: vec![0.0; n_groups],
            polarization: vec![0.0; n_groups],
        }
    }

    pub fn len(&self) -> usize {
        self.elec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elec.is_empty()
    }

    pub fn reset(&mut self) {
        self.elec.fill(0.0);
        self.vdw.fill(0.0);
        self.polarization.fill(0.0);
    }

    pub fn merge(&mut self, other: &EnergyGroups) {
        add_into(&mut self.elec, &other.elec);
        add_into(&mut self.vdw, &other.vdw);
        add_into(&mut self.polarization, &other.polarization);
    }

    /// Sum of every term over every group.
    pub fn total(&self) -> f64 {
        self.elec.iter().chain(&self.vdw).chain(&self.polarization).sum()
    }
}

fn add_into(dst: &mut [f64], src: &[f64]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

/// Everything a kernel call accumulates into.
///
/// Kernels only ever add to these arrays; [`reset`](Self::reset) once per step.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelOutput {
    /// Flat xyz force per particle.
    pub forces: Vec<f64>,
    /// Flat xyz force per shift vector.
    pub shift_forces: Vec<f64>,
    pub energies: EnergyGroups,
    /// Generalized Born chain-rule accumulator per particle.
    pub dvda: Vec<f64>,
}

impl KernelOutput {
    pub fn new(n_particles: usize, n_shifts: usize, n_groups: usize) -> Self {
        Self {
            forces: vec![0.0; DIM * n_particles],
            shift_forces: vec![0.0; DIM * n_shifts],
            energies: EnergyGroups::new(n_groups),
            dvda: vec![0.0; n_particles],
        }
    }

    /// Zeroed buffer with the same dimensions.
    pub fn zeroed_like(&self) -> Self {
        Self::new(self.n_particles(), self.n_shifts(), self.energies.len())
    }

    pub fn n_particles(&self) -> usize {
        self.forces.len() / DIM
    }

    pub fn n_shifts(&self) -> usize {
        self.shift_forces.len() / DIM
    }

    pub fn reset(&mut self) {
        self.forces.fill(0.0);
        self.shift_forces.fill(0.0);
        self.energies.reset();
        self.dvda.fill(0.0);
    }

    /// Add another output of the same dimensions.
    pub fn merge(&mut self, other: &KernelOutput) {
        add_into(&mut self.forces, &other.forces);
        add_into(&mut self.shift_forces, &other.shift_forces);
        self.energies.merge(&other.energies);
        add_into(&mut self.dvda, &other.dvda);
    }

    pub fn force(&self, i: usize) -> Vec3 {
        load_vec3(&self.forces, i)
    }

    pub fn shift_force(&self, s: usize) -> Vec3 {
        load_vec3(&self.shift_forces, s)
    }

    /// Sum of all particle forces.
    pub fn net_force(&self) -> Vec3 {
        (0..self.n_particles()).map(|i| self.force(i)).sum()
    }
}

/// Operation counters threaded through kernel calls.
///
/// Monotonically incremented; kernels never read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelCounters {
    pub outer_iterations: u64,
    pub inner_iterations: u64,
    pub flops: u64,
}

impl KernelCounters {
    /// Add `outer`/`inner` iterations and their weighted cost.
    #[inline]
    pub fn record(&mut self, outer: u64, inner: u64, weights: &FlopWeights) {
        self.outer_iterations += outer;
        self.inner_iterations += inner;
        self.flops += weights.cost(outer, inner);
    }

    pub fn merge(&mut self, other: &KernelCounters) {
        self.outer_iterations += other.outer_iterations;
        self.inner_iterations += other.inner_iterations;
        self.flops += other.flops;
    }
}
