//! Pairwise non-bonded force and energy kernels.
//!
//! Evaluates cutoff-limited electrostatics and van der Waals interactions
//! over a neighbor list, accumulating:
//! - per-particle forces
//! - per-group electrostatic, van der Waals and polarization energies
//! - per-shift-vector forces for the virial
//! - iteration and operation counters
//!
//! One generic [`PairKernel`] is monomorphized per combination of
//! electrostatics model, van der Waals model, site geometry and output mode,
//! and runs its inner loop over fixed-width SIMD lanes. [`select_kernel`]
//! picks the combination at runtime.
//!
//! # Example
//!
//! ```
//! use nonbond_kernel::{
//!     ElectrostaticsKind, GeometryKind, InteractionParameterTable, KernelConfig,
//!     KernelCounters, KernelInputs, KernelOutput, NeighborListBuilder, OutputKind,
//!     ParticleParams, ShiftVectors, VdwKind, select_kernel,
//! };
//!
//! let config = KernelConfig::new(
//!     ElectrostaticsKind::ReactionField,
//!     VdwKind::LennardJones,
//!     GeometryKind::ParticleParticle,
//!     OutputKind::ForceEnergy,
//! );
//! let kernel = select_kernel(&config).unwrap();
//!
//! let positions = [0.0, 0.0, 0.0, 0.4, 0.0, 0.0];
//! let params = ParticleParams::new(vec![0.5, -0.5], vec![0, 0]);
//! let table = InteractionParameterTable::from_sigma_epsilon(&[0.3], &[0.5]).unwrap();
//! let shifts = ShiftVectors::none();
//! let inputs = KernelInputs {
//!     positions: &positions,
//!     params: &params,
//!     table: &table,
//!     shifts: &shifts,
//! };
//!
//! let mut nlist = NeighborListBuilder::new();
//! nlist.push(0, 0, 0, &[1]);
//! let nlist = nlist.build();
//!
//! let mut output = KernelOutput::new(2, shifts.len(), 1);
//! let mut counters = KernelCounters::default();
//! kernel.validate(&nlist, &inputs, &output).unwrap();
//! kernel.evaluate(&nlist, &inputs, &mut output, &mut counters);
//!
//! assert!(output.energies.elec[0] < 0.0);
//! assert_eq!(output.force(0), -output.force(1));
//! assert_eq!(counters.inner_iterations, 1);
//! ```

pub mod blocking;
pub mod config;
pub mod dispatch;
pub mod elec;
pub mod error;
pub mod flops;
pub mod geometry;
pub mod kernel;
pub mod nblist;
pub mod output;
pub mod parallel;
pub mod params;
pub mod reduce;
pub mod shift;
pub mod table;
pub mod vdw;

pub use blocking::{LaneBlock, LaneBlocks, lane_blocks};
pub use config::{
    ElectrostaticsKind, GeometryKind, InteractionConstants, KernelConfig, OutputKind, VdwKind,
    kernel_name,
};
pub use dispatch::{
    KernelTables, check_born_radii, is_supported, select_kernel, select_kernel_with_tables,
};
pub use error::{KernelError, Result};
pub use flops::FlopWeights;
pub use kernel::{ForceAndEnergy, ForceOnly, KernelInputs, NonbondedKernel, OutputMode, PairKernel};
pub use nblist::{NeighborList, NeighborListBuilder, OuterEntry};
pub use output::{EnergyGroups, KernelCounters, KernelOutput};
pub use parallel::{evaluate_parallel, evaluate_partitions, validate_partitions};
pub use params::{BHAM_STRIDE, InteractionParameterTable, LJ_STRIDE, ParticleParams};
pub use shift::{CENTRAL_SHIFT, NUM_SHIFTS, ShiftVectors};
pub use table::SplineTable;
