//! JSON kernel specifications for nonbond.
//!
//! A `.nonbond.json` file names one kernel configuration together with the
//! per-particle parameters and van der Waals coefficients it runs on:
//! - kernel axes and interaction constants, with defaults for omitted fields
//! - charges, type indices and optional Born radii
//! - coefficients as σ/ε pairs, plain C6/C12 or Buckingham matrices, or the
//!   premultiplied table a kernel consumes

pub mod error;
pub mod schema;

pub use error::{FormatError, Result};
pub use schema::{
    CoefficientSpec, FORMAT_VERSION, KernelSpec, ParameterSpec, export_kernel_spec,
    load_kernel_spec, parse_kernel_spec, save_kernel_spec,
};
