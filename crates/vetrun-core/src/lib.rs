//! vetrun core
//!
//! Ties the launch and download pipelines together behind one
//! configuration type and one facade. Higher layers (CLI, orchestration)
//! consume the [`Gate`] and the result contract it returns; they never
//! reach into the pipelines directly.

mod config;
mod error;
mod gate;

pub use config::Config;
pub use error::CoreError;
pub use gate::Gate;

pub use vetrun_download::{DownloadOutcome, Downloader, TrustPolicy};
pub use vetrun_launch::{DetachedLaunch, LaunchSpec, Launcher};
pub use vetrun_result::OpResult;
pub use vetrun_sign::{FixedVerifier, PlatformVerifier, SignatureVerifier};

pub type Result<T> = std::result::Result<T, CoreError>;
