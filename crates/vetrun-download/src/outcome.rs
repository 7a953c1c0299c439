//! Download outcome

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use vetrun_result::OpResult;
use vetrun_sign::CertificateInfo;

use crate::policy::PolicyViolation;

/// Outcome of one download attempt.
///
/// Specializes [`OpResult`] with the source URI, destination path and the
/// post-fetch integrity data. Constructed with failure defaults, mutated
/// in place by the pipeline stages, then returned by value. `file_size`
/// and `signature_valid` are only meaningful when the outcome succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub result: OpResult,
    pub uri: Url,
    pub destination: PathBuf,
    pub file_size: u64,
    pub signature_valid: bool,
    /// SHA-256 of the fetched file, recorded during the stream copy.
    pub sha256: Option<String>,
    /// Signing certificate details, when the file is signed and the
    /// platform can describe it.
    pub certificate: Option<CertificateInfo>,
    /// Set when the download was rejected by the trust policy.
    pub violation: Option<PolicyViolation>,
}

impl DownloadOutcome {
    pub fn new(uri: Url, destination: &Path) -> Self {
        Self {
            result: OpResult::new(),
            uri,
            destination: destination.to_path_buf(),
            file_size: 0,
            signature_valid: false,
            sha256: None,
            certificate: None,
            violation: None,
        }
    }

    /// Mark the fetch stage successful. Later verification stages may
    /// still fail the outcome; the last marker call wins.
    pub fn succeed(&mut self) {
        self.result.mark_success();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.result.mark_fail(message);
    }

    /// Record a policy rejection.
    pub fn reject(&mut self, violation: PolicyViolation) {
        self.result.mark_fail(violation.to_string());
        self.violation = Some(violation);
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_failure()
    }

    pub fn first_output(&self) -> &str {
        self.result.first_output()
    }
}
