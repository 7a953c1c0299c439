//! Launch pipeline

use std::env;
use std::path::Path;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::Arc;

use parking_lot::Mutex;

use vetrun_result::{codes, OpResult};
use vetrun_sign::SignatureVerifier;

use crate::lock::FileLock;
use crate::spec::LaunchSpec;

/// The working-directory swap touches process-wide state, so concurrent
/// launches serialize on this mutex. The lock/verify/spawn section itself
/// only uses per-call state.
static CWD_SWAP: Mutex<()> = Mutex::new(());

/// Runs executables through the validate -> lock -> verify -> start
/// pipeline and reports outcomes as [`OpResult`] values.
pub struct Launcher {
    verifier: Arc<dyn SignatureVerifier>,
}

impl Launcher {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Launch the executable described by `spec` and block until it exits.
    ///
    /// Expected failures (bad working directory, missing file, failed
    /// verification, non-zero exit) come back as failed results with code
    /// `-1` or the child's exit code; this method never panics and never
    /// leaves the file lock held or the working directory altered.
    pub fn launch(&self, spec: &LaunchSpec) -> OpResult {
        if !spec.working_dir.is_absolute() {
            return OpResult::fail(
                codes::INVALID_PARAMETER,
                format!(
                    "Working directory {} is not an absolute path",
                    spec.working_dir.display()
                ),
            );
        }
        if !spec.working_dir.is_dir() {
            return OpResult::fail(
                codes::INVALID_PARAMETER,
                format!(
                    "Working directory {} does not exist",
                    spec.working_dir.display()
                ),
            );
        }
        let executable = spec.executable();
        if !executable.is_file() {
            return OpResult::fail(
                codes::INVALID_PARAMETER,
                format!("File {} not found", executable.display()),
            );
        }

        if spec.verbose {
            tracing::info!(
                file = %spec.file_name,
                arguments = ?spec.arguments,
                working_dir = %spec.working_dir.display(),
                "launching"
            );
        }

        let _swap_guard = CWD_SWAP.lock();

        let original_dir = match env::current_dir() {
            Ok(dir) => dir,
            Err(error) => {
                return OpResult::fail(
                    codes::INVALID_PARAMETER,
                    format!("Cannot determine current directory: {error}"),
                )
            }
        };
        if let Err(error) = env::set_current_dir(&spec.working_dir) {
            return OpResult::fail(
                codes::INVALID_PARAMETER,
                format!(
                    "Cannot enter working directory {}: {error}",
                    spec.working_dir.display()
                ),
            );
        }

        let mut result = self.locked_start(spec, &executable);

        // Restore on every path. A failed restore is reported, not ignored:
        // as the result itself, or as a warning when the launch already
        // failed for another reason.
        if let Err(error) = env::set_current_dir(&original_dir) {
            tracing::error!(
                directory = %original_dir.display(),
                %error,
                "failed to restore working directory"
            );
            let message = format!(
                "Could not restore working directory {}: {error}",
                original_dir.display()
            );
            if result.is_failure() {
                result.push_output(format!("Warning: {message}"));
            } else {
                result = OpResult::fail(codes::INVALID_PARAMETER, message);
            }
        }

        result
    }

    /// Lock the binary, verify it while locked, then start it. The lock
    /// guard drops on every return path, releasing the read lock only
    /// after the spawn decision is made.
    fn locked_start(&self, spec: &LaunchSpec, executable: &Path) -> OpResult {
        let _lock = match FileLock::shared(executable) {
            Ok(lock) => lock,
            Err(error) => {
                return OpResult::fail(
                    codes::INVALID_PARAMETER,
                    format!("Cannot lock file {}: {error}", executable.display()),
                )
            }
        };

        if spec.verify_signature {
            match self.verifier.verify_trust(executable) {
                Ok(true) => {}
                Ok(false) => {
                    return OpResult::fail(
                        codes::INVALID_PARAMETER,
                        format!("File {} is not digitally signed", spec.file_name),
                    )
                }
                Err(error) => {
                    return OpResult::fail(
                        codes::INVALID_PARAMETER,
                        format!(
                            "Signature verification failed for {}: {error}",
                            spec.file_name
                        ),
                    )
                }
            }
        }

        run_child(spec, executable)
    }
}

/// Spawn the child and drain or wait on it.
fn run_child(spec: &LaunchSpec, executable: &Path) -> OpResult {
    let mut command = build_command(spec, executable);
    let mut result = OpResult::new();

    if spec.redirect_output && !spec.use_shell {
        command.stdin(Stdio::null());
        match command.output() {
            Ok(output) => {
                result.code = exit_code(&output.status);
                result.output = split_captured(&output);
            }
            Err(error) => {
                tracing::debug!(%error, "process spawn failed");
                return OpResult::fail(
                    codes::INVALID_PARAMETER,
                    format!("File {} not found", spec.file_name),
                );
            }
        }
    } else {
        match command.status() {
            Ok(status) => {
                result.code = exit_code(&status);
                if result.code != codes::SUCCESS {
                    // No output was captured, so leave one diagnostic line.
                    result.push_output(format!("Process exited with code {}", result.code));
                }
            }
            Err(error) => {
                tracing::debug!(%error, "process spawn failed");
                return OpResult::fail(
                    codes::INVALID_PARAMETER,
                    format!("File {} not found", spec.file_name),
                );
            }
        }
    }

    if spec.verbose {
        for line in &result.output {
            tracing::info!(output = %line);
        }
        tracing::info!(code = result.code, "process exited");
    }

    result
}

fn build_command(spec: &LaunchSpec, executable: &Path) -> Command {
    let mut command = if spec.use_shell {
        let line = shell_line(executable, &spec.arguments);
        #[cfg(windows)]
        let command = {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(line);
            command
        };
        #[cfg(not(windows))]
        let command = {
            let mut command = Command::new("sh");
            command.arg("-c").arg(line);
            command
        };
        command
    } else {
        let mut command = Command::new(executable);
        command.args(&spec.arguments);
        command
    };
    command.current_dir(&spec.working_dir);
    command
}

/// Arguments are joined verbatim; quoting is the caller's responsibility
/// in shell mode.
fn shell_line(executable: &Path, arguments: &[String]) -> String {
    let mut line = executable.display().to_string();
    for argument in arguments {
        line.push(' ');
        line.push_str(argument);
    }
    line
}

/// Stdout lines first, then stderr lines; empties dropped.
fn split_captured(output: &Output) -> Vec<String> {
    let mut lines = split_lines(&output.stdout);
    lines.extend(split_lines(&output.stderr));
    lines
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Child exit code; death by signal maps to `-1`.
fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(codes::INVALID_PARAMETER)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use vetrun_sign::FixedVerifier;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn launcher(trusted: bool) -> Launcher {
        let verifier = if trusted {
            FixedVerifier::trusting()
        } else {
            FixedVerifier::distrusting()
        };
        Launcher::new(Arc::new(verifier))
    }

    #[test]
    fn test_relative_working_dir_rejected() {
        let result = launcher(true).launch(&LaunchSpec::new("relative/dir", "tool"));
        assert_eq!(result.code, codes::INVALID_PARAMETER);
        assert!(result.first_output().contains("relative/dir"));
    }

    #[test]
    fn test_missing_working_dir_rejected() {
        let result = launcher(true).launch(&LaunchSpec::new("/nonexistent/vetrun", "tool"));
        assert_eq!(result.code, codes::INVALID_PARAMETER);
        assert!(result.first_output().contains("/nonexistent/vetrun"));
    }

    #[test]
    fn test_missing_executable_rejected() {
        let dir = TempDir::new().unwrap();
        let result = launcher(true).launch(&LaunchSpec::new(dir.path(), "absent.sh"));
        assert_eq!(result.code, codes::INVALID_PARAMETER);
        assert!(result.first_output().contains("not found"));
    }

    #[test]
    fn test_unsigned_executable_never_starts() {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("executed.marker");
        write_script(dir.path(), "tool.sh", &format!("touch {}", marker.display()));

        let spec = LaunchSpec::new(dir.path(), "tool.sh")
            .verify_signature(true)
            .redirect_output(true);
        let result = launcher(false).launch(&spec);

        assert_eq!(result.code, codes::INVALID_PARAMETER);
        assert!(result.first_output().contains("not digitally signed"));
        assert!(!marker.exists(), "child must not run after failed verify");
    }

    #[test]
    fn test_signed_executable_runs_after_verify() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "tool.sh", "echo verified-run");

        let spec = LaunchSpec::new(dir.path(), "tool.sh")
            .verify_signature(true)
            .redirect_output(true);
        let result = launcher(true).launch(&spec);

        assert!(result.is_success());
        assert_eq!(result.first_output(), "verified-run");
    }

    #[test]
    fn test_pass_scenario_two_lines() {
        let dir = TempDir::new().unwrap();
        write_script(
            dir.path(),
            "tool.sh",
            "echo \"pass: $1\"\necho \"all checks green\"\nexit 0",
        );

        let spec = LaunchSpec::new(dir.path(), "tool.sh")
            .arguments(["pass"])
            .redirect_output(true);
        let result = launcher(true).launch(&spec);

        assert_eq!(result.code, codes::SUCCESS);
        assert_eq!(result.output.len(), 2);
        assert!(result.first_output().contains("pass"));
    }

    #[test]
    fn test_fail_scenario_five_lines() {
        let dir = TempDir::new().unwrap();
        write_script(
            dir.path(),
            "tool.sh",
            "echo \"fail: $1\"\n\
             echo \"error: validation\"\n\
             echo \"rejected by gate\"\n\
             echo \"line four\"\n\
             echo \"line five\" 1>&2\n\
             exit 100",
        );

        let spec = LaunchSpec::new(dir.path(), "tool.sh")
            .arguments(["fail"])
            .redirect_output(true);
        let result = launcher(true).launch(&spec);

        assert_eq!(result.code, 100);
        assert_eq!(result.output.len(), 5);
        let joined = result.output.join("\n");
        assert!(joined.contains("fail"));
        assert!(joined.contains("error"));
        assert!(joined.contains("rejected"));
        // Stderr lines come after stdout lines.
        assert_eq!(result.output.last().unwrap(), "line five");
    }

    #[test]
    fn test_synthetic_line_without_redirection() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "tool.sh", "exit 7");

        let result = launcher(true).launch(&LaunchSpec::new(dir.path(), "tool.sh"));
        assert_eq!(result.code, 7);
        assert_eq!(result.output, vec!["Process exited with code 7"]);
    }

    #[test]
    fn test_shell_mode() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "tool.sh", "exit 0");

        let spec = LaunchSpec::new(dir.path(), "tool.sh").use_shell(true);
        let result = launcher(true).launch(&spec);
        assert_eq!(result.code, codes::SUCCESS);
    }

    #[test]
    fn test_working_directory_restored() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "tool.sh", "exit 0");

        // Read the directory while no launch holds the swap lock, so a
        // concurrently running launch test cannot be mid-swap.
        let before = {
            let _guard = CWD_SWAP.lock();
            env::current_dir().unwrap()
        };
        let result = launcher(true).launch(
            &LaunchSpec::new(dir.path(), "tool.sh").redirect_output(true),
        );
        assert!(result.is_success());
        let after = {
            let _guard = CWD_SWAP.lock();
            env::current_dir().unwrap()
        };
        assert_eq!(after, before);
    }

    #[test]
    fn test_child_runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "tool.sh", "pwd");

        let result = launcher(true).launch(
            &LaunchSpec::new(dir.path(), "tool.sh").redirect_output(true),
        );
        assert!(result.is_success());
        let reported = fs::canonicalize(result.first_output()).unwrap();
        assert_eq!(reported, fs::canonicalize(dir.path()).unwrap());
    }
}
