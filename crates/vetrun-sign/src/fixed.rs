//! Deterministic verifier

use std::path::Path;

use crate::verifier::ensure_file;
use crate::{CertificateInfo, Result, SignError, SignatureVerifier};

/// Verifier with a preset answer.
///
/// Enforces the same input contract as [`PlatformVerifier`] but returns a
/// fixed trust decision, so pipelines can be exercised without a platform
/// trust store or signed fixtures.
///
/// [`PlatformVerifier`]: crate::PlatformVerifier
#[derive(Debug, Clone, Default)]
pub struct FixedVerifier {
    trusted: bool,
    certificate: Option<CertificateInfo>,
}

impl FixedVerifier {
    /// A verifier that reports every existing file as signed and trusted.
    pub fn trusting() -> Self {
        Self {
            trusted: true,
            certificate: None,
        }
    }

    /// A verifier that reports every existing file as unsigned.
    pub fn distrusting() -> Self {
        Self {
            trusted: false,
            certificate: None,
        }
    }

    /// Attach certificate details returned by `describe_certificate`.
    pub fn with_certificate(mut self, certificate: CertificateInfo) -> Self {
        self.certificate = Some(certificate);
        self
    }
}

impl SignatureVerifier for FixedVerifier {
    fn verify_trust(&self, path: &Path) -> Result<bool> {
        ensure_file(path)?;
        Ok(self.trusted)
    }

    fn describe_certificate(&self, path: &Path) -> Result<CertificateInfo> {
        ensure_file(path)?;
        self.certificate
            .clone()
            .ok_or(SignError::Unsupported("no certificate configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn sample_certificate() -> CertificateInfo {
        CertificateInfo {
            subject: "CN=Fixture".to_string(),
            issuer: "CN=Fixture CA".to_string(),
            not_before: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            not_after: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            serial_number: "01".to_string(),
            thumbprint: "AB".to_string(),
        }
    }

    #[test]
    fn test_preset_answers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"binary").unwrap();

        assert!(FixedVerifier::trusting()
            .verify_trust(file.path())
            .unwrap());
        assert!(!FixedVerifier::distrusting()
            .verify_trust(file.path())
            .unwrap());
    }

    #[test]
    fn test_contract_still_enforced() {
        let verifier = FixedVerifier::trusting();
        assert!(matches!(
            verifier.verify_trust(Path::new("")),
            Err(SignError::EmptyPath)
        ));
    }

    #[test]
    fn test_certificate_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"binary").unwrap();

        let cert = sample_certificate();
        let verifier = FixedVerifier::trusting().with_certificate(cert.clone());
        assert_eq!(verifier.describe_certificate(file.path()).unwrap(), cert);

        let bare = FixedVerifier::trusting();
        assert!(matches!(
            bare.describe_certificate(file.path()),
            Err(SignError::Unsupported(_))
        ));
    }
}
