//! vetrun secure downloader
//!
//! Pulls files over HTTPS through a fixed pipeline: validate the URI
//! against a caller-owned [`TrustPolicy`] (scheme, host allow-list, path
//! traversal, extension allow-list), fetch with a bounded retry budget,
//! then verify the result on disk (existence, size against a separate
//! metadata query, digital signature). Policy rejections and integrity
//! failures come back as failed [`DownloadOutcome`] values; only malformed
//! caller input is an `Err`.

mod downloader;
mod error;
mod fetch;
mod outcome;
mod policy;

pub use downloader::{Downloader, DEFAULT_REQUEST_TIMEOUT};
pub use error::DownloadError;
pub use outcome::DownloadOutcome;
pub use policy::{PolicyViolation, TrustPolicy};

pub type Result<T> = std::result::Result<T, DownloadError>;
