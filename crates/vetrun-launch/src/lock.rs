//! Read lock on the target executable

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// Shared (read) lock on a file, held from signature verification through
/// the spawn decision.
///
/// Concurrent readers are permitted; writers are blocked for the lock's
/// lifetime, so the binary cannot be swapped between the check and the
/// spawn. On Unix this is an advisory `flock(LOCK_SH)`; on Windows the
/// shared lock is mandatory. Released on drop, on every exit path.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Open `path` for reading and take a shared lock on it.
    pub fn shared(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        file.lock_shared()?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(error) = fs2::FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), %error, "failed to release file lock");
        }
    }
}
