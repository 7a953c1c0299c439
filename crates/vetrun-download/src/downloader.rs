//! Download pipeline

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use url::Url;

use vetrun_sign::SignatureVerifier;

use crate::fetch::{classify, with_retry, FetchError};
use crate::outcome::DownloadOutcome;
use crate::policy::{has_traversal, TrustPolicy};
use crate::{DownloadError, Result};

/// Default per-request timeout. Exceeding it aborts the download without
/// consuming a retry.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Characters rejected in destination file names, matching the strictest
/// platform rather than the current one.
const INVALID_FILE_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Policy-gated HTTPS downloader.
///
/// Owns its [`TrustPolicy`]; reconfiguring the policy requires `&mut`
/// access, so concurrent downloads always evaluate a consistent snapshot.
/// TLS certificates are validated against the standard trust chain by the
/// underlying client before any body bytes are transferred.
pub struct Downloader {
    client: Client,
    policy: TrustPolicy,
    verifier: Arc<dyn SignatureVerifier>,
}

impl Downloader {
    pub fn new(policy: TrustPolicy, verifier: Arc<dyn SignatureVerifier>) -> Result<Self> {
        Self::with_timeout(policy, verifier, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        policy: TrustPolicy,
        verifier: Arc<dyn SignatureVerifier>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            policy,
            verifier,
        })
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Reconfigure the trust policy. Requires exclusive access: a policy
    /// change can never race an in-flight download.
    pub fn policy_mut(&mut self) -> &mut TrustPolicy {
        &mut self.policy
    }

    /// Download `uri` to `destination`, overwriting any existing file.
    ///
    /// Policy rejections, fetch failures and integrity failures come back
    /// as a failed [`DownloadOutcome`].
    ///
    /// # Errors
    ///
    /// Only for malformed caller input: an unparseable URI, or a
    /// destination that is empty, not absolute, or contains invalid
    /// file-name characters.
    pub async fn download(&self, uri: &str, destination: &Path) -> Result<DownloadOutcome> {
        let url =
            Url::parse(uri).map_err(|error| DownloadError::InvalidUri(format!("{uri}: {error}")))?;
        validate_destination(destination)?;

        let mut outcome = DownloadOutcome::new(url.clone(), destination);

        // All policy gates run before any network I/O.
        if let Err(violation) = self.policy.check(&url) {
            tracing::warn!(uri = %url, %violation, "download rejected by trust policy");
            outcome.reject(violation);
            return Ok(outcome);
        }

        match self.fetch_with_retry(&url, destination).await {
            Ok(sha256) => {
                outcome.sha256 = Some(sha256);
                outcome.succeed();
            }
            Err(error) => {
                tracing::warn!(uri = %url, %error, "fetch failed");
                outcome.fail(error.to_string());
                return Ok(outcome);
            }
        }

        self.verify_downloaded(&mut outcome, &url, destination).await;

        if outcome.is_success() {
            tracing::info!(
                uri = %url,
                destination = %destination.display(),
                size = outcome.file_size,
                signed = outcome.signature_valid,
                "download verified"
            );
        }

        Ok(outcome)
    }

    /// Probe whether `uri` answers with a success status. Same URI
    /// validity predicate as `download`, but no policy gate, no retry and
    /// no body.
    pub async fn uri_exists(&self, uri: &str) -> Result<bool> {
        let url = parse_valid_uri(uri)?;
        let response = self.client.get(url).send().await?;
        Ok(response.status().is_success())
    }

    /// Size of the remote file as reported by the server, `0` when the
    /// server does not report one.
    pub async fn remote_size(&self, uri: &str) -> Result<u64> {
        let url = parse_valid_uri(uri)?;
        let response = self.client.get(url).send().await?;
        Ok(response.content_length().unwrap_or(0))
    }

    async fn fetch_with_retry(
        &self,
        url: &Url,
        destination: &Path,
    ) -> std::result::Result<String, FetchError> {
        with_retry(|attempt| self.fetch_once(url, destination, attempt)).await
    }

    /// One streaming GET to `destination`, hashing as it copies. Returns
    /// the hex SHA-256 of the written bytes.
    async fn fetch_once(
        &self,
        url: &Url,
        destination: &Path,
        attempt: u32,
    ) -> std::result::Result<String, FetchError> {
        tracing::debug!(uri = %url, attempt, "fetch attempt");

        match tokio::fs::remove_file(destination).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                return Err(FetchError::Fatal(format!(
                    "Cannot replace {}: {error}",
                    destination.display()
                )))
            }
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;
        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::Transient(format!(
                "Server error {status} from {url}"
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Fatal(format!(
                "Request for {url} failed with status {status}"
            )));
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|error| {
                FetchError::Fatal(format!("Cannot create {}: {error}", destination.display()))
            })?;
        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify)?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(|error| {
                FetchError::Fatal(format!("Cannot write {}: {error}", destination.display()))
            })?;
        }
        file.flush().await.map_err(|error| {
            FetchError::Fatal(format!("Cannot write {}: {error}", destination.display()))
        })?;

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Post-fetch integrity stage: the file must exist, its size must
    /// match the server's answer to a separate metadata query, and the
    /// signature check must be evaluable.
    async fn verify_downloaded(
        &self,
        outcome: &mut DownloadOutcome,
        url: &Url,
        destination: &Path,
    ) {
        let metadata = match tokio::fs::metadata(destination).await {
            Ok(metadata) => metadata,
            Err(_) => {
                outcome.fail(format!("File {} does not exist", destination.display()));
                return;
            }
        };
        outcome.file_size = metadata.len();

        // An unknown remote size skips the comparison; a failed metadata
        // query does not undo a completed transfer.
        let expected = self.remote_size(url.as_str()).await.unwrap_or(0);
        if !check_size(outcome, expected) {
            return;
        }

        self.check_signature(outcome, destination);
    }

    /// Record the signature verdict. The boolean itself is informational;
    /// an unsigned file does not fail the outcome, an unanswerable check
    /// does.
    fn check_signature(&self, outcome: &mut DownloadOutcome, destination: &Path) {
        match self.verifier.verify_trust(destination) {
            Ok(signed) => {
                outcome.signature_valid = signed;
                if signed {
                    outcome.certificate = self.verifier.describe_certificate(destination).ok();
                }
            }
            Err(error) => outcome.fail(format!("Signature check failed: {error}")),
        }
    }
}

/// Compare the on-disk size against the server-reported one. An
/// `expected` of zero means the server did not report a size and the
/// comparison is skipped. Returns whether verification may continue.
fn check_size(outcome: &mut DownloadOutcome, expected: u64) -> bool {
    if expected > 0 && expected != outcome.file_size {
        outcome.fail(format!(
            "File size mismatch. Expected: {expected}, Actual: {}",
            outcome.file_size
        ));
        return false;
    }
    true
}

/// Shared URI validity predicate: absolute, HTTPS, no traversal.
fn parse_valid_uri(uri: &str) -> Result<Url> {
    let url =
        Url::parse(uri).map_err(|error| DownloadError::InvalidUri(format!("{uri}: {error}")))?;
    if url.scheme() != "https" {
        return Err(DownloadError::InvalidUri(format!(
            "{uri}: scheme must be https"
        )));
    }
    if has_traversal(&url) {
        return Err(DownloadError::InvalidUri(format!(
            "{uri}: path traversal detected"
        )));
    }
    Ok(url)
}

fn validate_destination(destination: &Path) -> Result<()> {
    if destination.as_os_str().is_empty() {
        return Err(DownloadError::InvalidDestination(
            "file name cannot be empty".to_string(),
        ));
    }
    if !destination.is_absolute() {
        return Err(DownloadError::InvalidDestination(format!(
            "path must be rooted: {}",
            destination.display()
        )));
    }
    let file_name = destination
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            DownloadError::InvalidDestination(format!(
                "missing file name: {}",
                destination.display()
            ))
        })?;
    if file_name.chars().any(|c| INVALID_FILE_NAME_CHARS.contains(&c) || c.is_control()) {
        return Err(DownloadError::InvalidDestination(format!(
            "file name contains invalid characters: {file_name}"
        )));
    }
    Ok(())
}
