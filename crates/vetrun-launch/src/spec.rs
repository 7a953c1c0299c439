//! Launch parameters

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters for one launch. Immutable for the duration of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Directory to run the executable from. Must be absolute and exist.
    pub working_dir: PathBuf,
    /// File name (including extension) of the executable, resolved
    /// relative to `working_dir`.
    pub file_name: String,
    /// Command line arguments passed to the executable.
    pub arguments: Vec<String>,
    /// Capture stdout and stderr into the result's output lines.
    pub redirect_output: bool,
    /// Verify the executable's digital signature before starting it.
    pub verify_signature: bool,
    /// Start through the platform shell instead of spawning directly.
    /// Output cannot be redirected in this mode.
    pub use_shell: bool,
    /// Emit additional diagnostic log lines.
    pub verbose: bool,
}

impl LaunchSpec {
    pub fn new(working_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            file_name: file_name.into(),
            arguments: Vec::new(),
            redirect_output: false,
            verify_signature: false,
            use_shell: false,
            verbose: false,
        }
    }

    pub fn arguments(mut self, arguments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn redirect_output(mut self, redirect: bool) -> Self {
        self.redirect_output = redirect;
        self
    }

    pub fn verify_signature(mut self, verify: bool) -> Self {
        self.verify_signature = verify;
        self
    }

    pub fn use_shell(mut self, use_shell: bool) -> Self {
        self.use_shell = use_shell;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Full path of the target executable.
    pub fn executable(&self) -> PathBuf {
        self.working_dir.join(&self.file_name)
    }
}
