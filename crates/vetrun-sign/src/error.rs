//! Signature verification error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    /// Input-contract violation: the caller passed an empty path.
    #[error("File path cannot be empty")]
    EmptyPath,

    /// Input-contract violation: the file to verify does not exist.
    #[error("File does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("Certificate details are not available: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
