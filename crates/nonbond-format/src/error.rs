//! Error types for nonbond-format.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Kernel error: {0}")]
    Kernel(#[from] nonbond_kernel::KernelError),
}

pub type Result<T> = std::result::Result<T, FormatError>;
