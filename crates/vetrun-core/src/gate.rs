//! Coordination facade

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vetrun_download::{DownloadOutcome, Downloader, TrustPolicy};
use vetrun_launch::{DetachedLaunch, LaunchSpec, Launcher};
use vetrun_result::OpResult;
use vetrun_sign::{PlatformVerifier, SignatureVerifier};

use crate::config::Config;
use crate::Result;

/// The verified-execution and verified-acquisition gate.
///
/// Built once from a [`Config`] and a signature verifier; the sole
/// artifact higher layers consume is the result contract its operations
/// return.
pub struct Gate {
    launcher: Launcher,
    downloader: Downloader,
    verify_signatures: bool,
}

impl Gate {
    pub fn new(config: &Config, verifier: Arc<dyn SignatureVerifier>) -> Result<Self> {
        let mut policy = TrustPolicy::new();
        policy.set_trusted_hosts(config.trusted_hosts.iter().cloned());
        policy.set_allowed_extensions(config.allowed_extensions.iter().cloned());
        tracing::debug!(
            hosts = config.trusted_hosts.len(),
            extensions = config.allowed_extensions.len(),
            "trust policy configured"
        );

        let downloader = Downloader::with_timeout(
            policy,
            Arc::clone(&verifier),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            launcher: Launcher::new(verifier),
            downloader,
            verify_signatures: config.verify_signatures,
        })
    }

    /// Gate backed by the operating system's trust store.
    pub fn with_platform_verifier(config: &Config) -> Result<Self> {
        Self::new(config, Arc::new(PlatformVerifier::new()))
    }

    /// Launch an executable and block until it exits. When the config
    /// demands signature verification, it is applied even if the spec
    /// does not ask for it.
    pub fn launch(&self, spec: &LaunchSpec) -> OpResult {
        if self.verify_signatures && !spec.verify_signature {
            let spec = spec.clone().verify_signature(true);
            return self.launcher.launch(&spec);
        }
        self.launcher.launch(spec)
    }

    /// Fire-and-forget launch; see [`Launcher::launch_detached`].
    pub fn launch_detached(
        &self,
        working_dir: &Path,
        file_name: &str,
        arguments: &[String],
    ) -> OpResult {
        self.launcher.launch_detached(working_dir, file_name, arguments)
    }

    /// Detached launch with an opt-in completion handle.
    pub fn launch_detached_handle(
        &self,
        working_dir: &Path,
        file_name: &str,
        arguments: &[String],
    ) -> Result<DetachedLaunch> {
        Ok(self
            .launcher
            .launch_detached_handle(working_dir, file_name, arguments)?)
    }

    /// Download a file through the trust policy; see
    /// [`Downloader::download`].
    pub async fn download(&self, uri: &str, destination: &Path) -> Result<DownloadOutcome> {
        Ok(self.downloader.download(uri, destination).await?)
    }

    pub async fn uri_exists(&self, uri: &str) -> Result<bool> {
        Ok(self.downloader.uri_exists(uri).await?)
    }

    pub async fn remote_size(&self, uri: &str) -> Result<u64> {
        Ok(self.downloader.remote_size(uri).await?)
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Exclusive access for reconfiguration; cannot race in-flight
    /// downloads.
    pub fn downloader_mut(&mut self) -> &mut Downloader {
        &mut self.downloader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetrun_sign::FixedVerifier;

    fn config() -> Config {
        Config {
            trusted_hosts: vec!["dist.example.com".to_string()],
            allowed_extensions: vec![".exe".to_string()],
            request_timeout_secs: 30,
            verify_signatures: false,
        }
    }

    #[test]
    fn test_gate_from_config() {
        let gate = Gate::new(&config(), Arc::new(FixedVerifier::trusting())).unwrap();
        assert!(gate
            .downloader()
            .policy()
            .trusted_hosts()
            .contains("dist.example.com"));
    }

    #[tokio::test]
    async fn test_policy_rejection_flows_through_gate() {
        let gate = Gate::new(&config(), Arc::new(FixedVerifier::trusting())).unwrap();
        let outcome = gate
            .download(
                "https://other.example.com/setup.exe",
                Path::new("/tmp/vetrun-gate-test.exe"),
            )
            .await
            .unwrap();
        assert!(outcome.is_failure());
        assert!(outcome.first_output().contains("Untrusted host"));
    }

    #[cfg(unix)]
    #[test]
    fn test_config_forces_signature_verification() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("tool.sh");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = config();
        config.verify_signatures = true;
        let gate = Gate::new(&config, Arc::new(FixedVerifier::distrusting())).unwrap();

        // The spec does not ask for verification; the config does.
        let result = gate.launch(&LaunchSpec::new(dir.path(), "tool.sh"));
        assert!(result.is_failure());
        assert!(result.first_output().contains("not digitally signed"));
    }
}
