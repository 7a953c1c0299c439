//! Verification capability trait

use std::path::Path;

use crate::{CertificateInfo, Result, SignError};

/// Capability to decide whether a file carries a valid, trusted digital
/// signature.
///
/// `Ok(bool)` is the trust decision (full chain: publisher signature,
/// certificate validity window, revocation where the platform checks it).
/// `Err` is reserved for input-contract violations and platform inability,
/// never for "the file is unsigned".
pub trait SignatureVerifier: Send + Sync {
    /// Verify the digital signature of the file at `path`.
    ///
    /// # Errors
    ///
    /// [`SignError::EmptyPath`] if `path` is empty and
    /// [`SignError::FileNotFound`] if it does not exist; these are caller
    /// bugs, not business failures.
    fn verify_trust(&self, path: &Path) -> Result<bool>;

    /// Extract the signing certificate details for display or audit.
    ///
    /// Must not be used as a trust decision; only [`verify_trust`]
    /// decides trust.
    ///
    /// [`verify_trust`]: SignatureVerifier::verify_trust
    fn describe_certificate(&self, path: &Path) -> Result<CertificateInfo>;
}

/// Shared input-contract check for verifier implementations.
pub(crate) fn ensure_file(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(SignError::EmptyPath);
    }
    if !path.is_file() {
        return Err(SignError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ensure_file_rejects_empty_path() {
        assert!(matches!(
            ensure_file(Path::new("")),
            Err(SignError::EmptyPath)
        ));
    }

    #[test]
    fn test_ensure_file_rejects_missing_file() {
        let missing = PathBuf::from("/nonexistent/vetrun/no-such-file.bin");
        assert!(matches!(
            ensure_file(&missing),
            Err(SignError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_ensure_file_accepts_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ensure_file(file.path()).is_ok());
    }
}
