//! Error types for nonbond-kernel.
//!
//! The evaluation hot path never returns errors; these come from builders,
//! validation and kernel dispatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("unsupported kernel configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("invalid neighbor list: {0}")]
    InvalidNeighborList(String),

    #[error("invalid interaction parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid interaction table: {0}")]
    InvalidTable(String),

    #[error("invalid interaction constants: {0}")]
    InvalidConstants(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;
