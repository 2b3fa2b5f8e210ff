//! nonbond — non-bonded force-field evaluation.
//!
//! This is the umbrella crate that provides the [`ForceEvaluator`] driver and
//! re-exports the kernel, format and math crates.

pub use nonbond_format::{self, FormatError, KernelSpec, ParameterSpec};
pub use nonbond_kernel::{
    self, CENTRAL_SHIFT, ElectrostaticsKind, EnergyGroups, GeometryKind, InteractionConstants,
    InteractionParameterTable, KernelConfig, KernelCounters, KernelError, KernelInputs,
    KernelOutput, NeighborList, NeighborListBuilder, NonbondedKernel, OutputKind, ParticleParams,
    ShiftVectors, VdwKind, select_kernel,
};
pub use nonbond_math::{self, Vec3};

/// One dispatched kernel together with the parameters it runs on.
///
/// Positions and neighbor lists change every step and are passed per call;
/// everything else is fixed at construction.
pub struct ForceEvaluator {
    kernel: Box<dyn NonbondedKernel>,
    params: ParticleParams,
    table: InteractionParameterTable,
    shifts: ShiftVectors,
    n_groups: usize,
}

impl ForceEvaluator {
    /// Select a kernel for `config` and bind it to its parameters.
    pub fn new(
        config: &KernelConfig,
        params: ParticleParams,
        table: InteractionParameterTable,
        shifts: ShiftVectors,
        n_groups: usize,
    ) -> nonbond_kernel::Result<Self> {
        let kernel = select_kernel(config)?;
        params.validate(params.len(), table.ntype())?;
        nonbond_kernel::check_born_radii(config, &params)?;
        log::debug!(
            "{} over {} particles, {} types, {} shifts, {} groups",
            kernel.name(),
            params.len(),
            table.ntype(),
            shifts.len(),
            n_groups
        );
        Ok(Self {
            kernel,
            params,
            table,
            shifts,
            n_groups,
        })
    }

    /// Build from a parsed specification.
    pub fn from_spec(
        spec: &KernelSpec,
        shifts: ShiftVectors,
        n_groups: usize,
    ) -> nonbond_format::Result<Self> {
        spec.validate()?;
        let params = spec.parameters.particle_params()?;
        let table = spec.parameters.interaction_table()?;
        Ok(Self::new(&spec.kernel, params, table, shifts, n_groups)?)
    }

    pub fn kernel(&self) -> &dyn NonbondedKernel {
        self.kernel.as_ref()
    }

    pub fn params(&self) -> &ParticleParams {
        &self.params
    }

    pub fn n_particles(&self) -> usize {
        self.params.len()
    }

    /// Zeroed output buffer sized for this evaluator.
    pub fn output(&self) -> KernelOutput {
        KernelOutput::new(self.n_particles(), self.shifts.len(), self.n_groups)
    }

    fn inputs<'a>(&'a self, positions: &'a [f64]) -> KernelInputs<'a> {
        KernelInputs {
            positions,
            params: &self.params,
            table: &self.table,
            shifts: &self.shifts,
        }
    }

    /// Validate `nlist` and accumulate one kernel call into `output`.
    pub fn evaluate(
        &self,
        positions: &[f64],
        nlist: &NeighborList,
        output: &mut KernelOutput,
        counters: &mut KernelCounters,
    ) -> nonbond_kernel::Result<()> {
        let inputs = self.inputs(positions);
        self.kernel.validate(nlist, &inputs, output)?;
        self.kernel.evaluate(nlist, &inputs, output, counters);
        Ok(())
    }

    /// Validate and evaluate disjoint partitions in parallel.
    pub fn evaluate_partitions(
        &self,
        positions: &[f64],
        partitions: &[NeighborList],
        output: &mut KernelOutput,
        counters: &mut KernelCounters,
    ) -> nonbond_kernel::Result<()> {
        let inputs = self.inputs(positions);
        nonbond_kernel::validate_partitions(self.kernel(), partitions, &inputs, output)?;
        nonbond_kernel::evaluate_partitions(self.kernel(), partitions, &inputs, output, counters);
        Ok(())
    }

    /// Reset `output` and evaluate one step, split across the rayon pool.
    pub fn step(
        &self,
        positions: &[f64],
        nlist: &NeighborList,
        output: &mut KernelOutput,
        counters: &mut KernelCounters,
    ) -> nonbond_kernel::Result<()> {
        output.reset();
        let inputs = self.inputs(positions);
        self.kernel.validate(nlist, &inputs, output)?;
        nonbond_kernel::evaluate_parallel(self.kernel(), nlist, &inputs, output, counters);
        Ok(())
    }
}
