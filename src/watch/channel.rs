// src/watch/channel.rs

//! Seam between the orchestrator and the OS notification facility.
//!
//! Production code uses [`crate::watch::inotify::InotifyChannel`]; tests
//! drive the orchestrator with a scripted fake that never touches the
//! kernel.

use std::io;
use std::path::Path;
use std::time::Duration;

use crate::errors::Result;
use crate::types::{EventMask, WatchId};

/// Result of one readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one byte can be read without blocking.
    Ready,
    /// The supplied timeout elapsed first.
    TimedOut,
    /// A shutdown request arrived while waiting.
    Shutdown,
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// A notification channel that hands out watch ids and delivers raw event
/// records for them.
pub trait NotifyChannel {
    /// Start watching `path` for the changes in `mask`.
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> io::Result<WatchId>;

    /// Stop watching `id`.
    fn remove_watch(&mut self, id: WatchId) -> io::Result<()>;

    /// Block until the channel has data, the timeout elapses, or shutdown is
    /// requested. Failures of the wait primitive are
    /// [`crate::errors::WatchcmdError::Multiplex`].
    fn wait_ready(&mut self, timeout: Option<Duration>) -> Result<Readiness>;

    /// One read into `buf`. Returns the number of bytes written.
    fn read_events(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}
