//! Launch error types
//!
//! These are input-contract violations only. Expected launch failures
//! (missing executable, failed verification, non-zero exit) travel through
//! the returned `OpResult`, never through `Err`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("File name cannot be empty")]
    EmptyFileName,

    #[error("File {0} not found")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
