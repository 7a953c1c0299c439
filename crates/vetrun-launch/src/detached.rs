//! Fire-and-forget launch

use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use vetrun_result::{codes, OpResult};

use crate::error::LaunchError;
use crate::launcher::Launcher;
use crate::Result;

/// Handle to a detached launch.
///
/// Dropping the handle is the fire-and-forget path. Callers who want the
/// spawn outcome keep it and read the completion channel; callers who
/// change their mind before the background thread runs can cancel.
#[derive(Debug)]
pub struct DetachedLaunch {
    cancel: Arc<AtomicBool>,
    completion: Receiver<OpResult>,
}

impl DetachedLaunch {
    /// Request that the spawn be skipped. Effective only if the background
    /// thread has not reached the spawn yet; a process already started is
    /// not killed.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Spawn outcome if it is already available.
    pub fn try_outcome(&self) -> Option<OpResult> {
        match self.completion.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block up to `timeout` for the spawn outcome.
    pub fn wait_outcome(&self, timeout: Duration) -> Option<OpResult> {
        self.completion.recv_timeout(timeout).ok()
    }
}

impl Launcher {
    /// Validate that the executable exists, then spawn it on an unjoined
    /// background thread and return immediately.
    ///
    /// A `success()` here means "spawn was attempted", not "process
    /// started": a spawn error on the background thread is observable only
    /// as a log line. Use [`launch_detached_handle`] to opt in to the
    /// outcome.
    ///
    /// [`launch_detached_handle`]: Launcher::launch_detached_handle
    pub fn launch_detached(
        &self,
        working_dir: &Path,
        file_name: &str,
        arguments: &[String],
    ) -> OpResult {
        match self.launch_detached_handle(working_dir, file_name, arguments) {
            Ok(_) => OpResult::success(),
            Err(error) => OpResult::fail(codes::INVALID_PARAMETER, error.to_string()),
        }
    }

    /// Detached launch with an opt-in completion channel and a pre-spawn
    /// cancellation flag.
    ///
    /// # Errors
    ///
    /// Contract violations only: empty file name, or no file at
    /// `working_dir/file_name`. The spawn itself never raises here.
    pub fn launch_detached_handle(
        &self,
        working_dir: &Path,
        file_name: &str,
        arguments: &[String],
    ) -> Result<DetachedLaunch> {
        if file_name.is_empty() {
            return Err(LaunchError::EmptyFileName);
        }
        let executable = working_dir.join(file_name);
        if !executable.is_file() {
            return Err(LaunchError::FileNotFound(executable));
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, completion) = mpsc::channel();

        let flag = Arc::clone(&cancel);
        let working_dir = working_dir.to_path_buf();
        let file_name = file_name.to_string();
        let arguments = arguments.to_vec();
        thread::spawn(move || {
            if flag.load(Ordering::SeqCst) {
                let _ = sender.send(OpResult::fail(
                    codes::INVALID_PARAMETER,
                    format!("Detached launch of {file_name} cancelled before spawn"),
                ));
                return;
            }

            let outcome = match Command::new(&executable)
                .args(&arguments)
                .current_dir(&working_dir)
                .spawn()
            {
                Ok(child) => {
                    tracing::info!(
                        file = %file_name,
                        pid = child.id(),
                        "started detached process"
                    );
                    OpResult::success_with(format!("Started {} {}", file_name, arguments.join(" ")))
                }
                Err(error) => {
                    // The fire-and-forget caller already got success(); this
                    // log line is the only side channel for the failure.
                    tracing::error!(file = %file_name, %error, "detached spawn failed");
                    OpResult::fail(
                        codes::INVALID_PARAMETER,
                        format!("File {file_name} not found"),
                    )
                }
            };
            let _ = sender.send(outcome);
        });

        Ok(DetachedLaunch { cancel, completion })
    }
}
