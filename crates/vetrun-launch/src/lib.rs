//! vetrun process launcher
//!
//! Runs external executables through a fixed pipeline: validate the
//! working directory and target file, hold a read lock on the binary,
//! optionally verify its digital signature while locked, spawn, capture
//! output, and restore process state. The read lock closes the
//! time-of-check-to-time-of-use window: the binary that was verified is
//! the binary that runs.
//!
//! Launch calls block until the child exits; there is no built-in child
//! timeout. The only asynchronous path is the detached launch, which
//! reports "spawn attempted" and nothing more unless the caller keeps the
//! completion handle.

mod detached;
mod error;
mod launcher;
mod lock;
mod spec;

pub use detached::DetachedLaunch;
pub use error::LaunchError;
pub use launcher::Launcher;
pub use lock::FileLock;
pub use spec::LaunchSpec;

pub type Result<T> = std::result::Result<T, LaunchError>;
