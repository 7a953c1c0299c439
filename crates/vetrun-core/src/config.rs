//! Gate configuration

use serde::{Deserialize, Serialize};

/// Process-level configuration for a [`Gate`](crate::Gate).
///
/// Intended to be loaded once at startup; the gate built from it owns the
/// resulting trust policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosts downloads may come from (exact match).
    pub trusted_hosts: Vec<String>,
    /// File extensions downloads may carry, `.ext` form.
    pub allowed_extensions: Vec<String>,
    /// Per-request timeout for downloads, in seconds.
    pub request_timeout_secs: u64,
    /// Verify executable signatures on every launch, regardless of what
    /// the individual launch spec asks for.
    pub verify_signatures: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trusted_hosts: Vec::new(),
            allowed_extensions: Vec::new(),
            request_timeout_secs: 300,
            verify_signatures: false,
        }
    }
}
