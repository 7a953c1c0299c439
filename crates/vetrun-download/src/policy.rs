//! Trust policy

use std::collections::BTreeSet;
use std::path::Path;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Policy rejection reasons. Each validation failure is distinct and
/// named; callers can match on the reason instead of parsing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyViolation {
    #[error("URI scheme `{0}` is not https")]
    NonHttpsScheme(String),

    #[error("Untrusted host: {0}")]
    UntrustedHost(String),

    #[error("Path traversal detected in URI path")]
    PathTraversal,

    #[error("URI extension `{0}` is not allowed")]
    DisallowedExtension(String),
}

/// Allow-lists gating which downloads are permitted.
///
/// A plain value owned by its `Downloader`: mutation requires `&mut`
/// access, so a policy shared across concurrent downloads is immutable by
/// construction. Configure it once at startup, then hand it over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicy {
    trusted_hosts: BTreeSet<String>,
    allowed_extensions: BTreeSet<String>,
}

impl TrustPolicy {
    /// Empty policy: every download is rejected until hosts and
    /// extensions are configured.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trusted_hosts(&self) -> &BTreeSet<String> {
        &self.trusted_hosts
    }

    /// Replace the trusted-host allow-list.
    pub fn set_trusted_hosts(&mut self, hosts: impl IntoIterator<Item = impl Into<String>>) {
        self.trusted_hosts = hosts.into_iter().map(Into::into).collect();
    }

    /// Add one trusted host.
    pub fn trust_host(&mut self, host: impl Into<String>) {
        self.trusted_hosts.insert(host.into());
    }

    pub fn allowed_extensions(&self) -> &BTreeSet<String> {
        &self.allowed_extensions
    }

    /// Replace the extension allow-list. Entries are normalized to a
    /// lowercase `.ext` form.
    pub fn set_allowed_extensions(
        &mut self,
        extensions: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|extension| normalize_extension(&extension.into()))
            .collect();
    }

    /// Add one allowed extension.
    pub fn allow_extension(&mut self, extension: impl Into<String>) {
        self.allowed_extensions
            .insert(normalize_extension(&extension.into()));
    }

    /// Evaluate every policy gate against `url`, in a fixed order:
    /// scheme, host, traversal, extension. The first violation wins.
    pub fn check(&self, url: &Url) -> Result<(), PolicyViolation> {
        if url.scheme() != "https" {
            return Err(PolicyViolation::NonHttpsScheme(url.scheme().to_string()));
        }

        // Exact match only: no wildcard or subdomain trust.
        let host = url.host_str().unwrap_or_default();
        if !self.trusted_hosts.contains(host) {
            return Err(PolicyViolation::UntrustedHost(host.to_string()));
        }

        if has_traversal(url) {
            return Err(PolicyViolation::PathTraversal);
        }

        let extension = uri_extension(url);
        if !self.allowed_extensions.contains(&extension) {
            return Err(PolicyViolation::DisallowedExtension(extension));
        }

        Ok(())
    }
}

/// `..` anywhere in the path rejects the URI, in both the raw and the
/// percent-decoded form, so encoded traversal attempts are caught too.
pub(crate) fn has_traversal(url: &Url) -> bool {
    let raw = url.path();
    if raw.contains("..") {
        return true;
    }
    percent_decode_str(raw).decode_utf8_lossy().contains("..")
}

fn uri_extension(url: &Url) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{}", extension.to_lowercase()))
        .unwrap_or_default()
}

fn normalize_extension(extension: &str) -> String {
    let extension = extension.to_lowercase();
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{extension}")
    }
}
