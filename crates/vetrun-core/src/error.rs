//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Launch error: {0}")]
    Launch(#[from] vetrun_launch::LaunchError),

    #[error("Download error: {0}")]
    Download(#[from] vetrun_download::DownloadError),

    #[error("Signature error: {0}")]
    Sign(#[from] vetrun_sign::SignError),
}
