//! Signing certificate details

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Details of the certificate that signed a file.
///
/// Display and audit data only. Trust is decided exclusively by
/// [`SignatureVerifier::verify_trust`](crate::SignatureVerifier::verify_trust);
/// nothing in this struct is a trust decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    /// Start of the certificate validity window.
    pub not_before: DateTime<Utc>,
    /// End of the certificate validity window.
    pub not_after: DateTime<Utc>,
    pub serial_number: String,
    pub thumbprint: String,
}
