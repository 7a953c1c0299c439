//! Download error types
//!
//! `Err` values are reserved for malformed caller input and probe
//! transport failures. Policy rejections and integrity failures are
//! reported through the `DownloadOutcome`, never raised.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Invalid destination file name: {0}")]
    InvalidDestination(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
