use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;
use watchcmd::errors::{Result, WatchcmdError};
use watchcmd::types::{EventMask, WatchId};
use watchcmd::watch::{NotifyChannel, Readiness};

/// One scripted wake-up.
#[derive(Debug, Clone)]
pub enum Step {
    /// Channel becomes ready; the next read returns these bytes.
    Ready(Vec<u8>),
    /// Channel becomes ready; the next read fails.
    ReadError(io::ErrorKind),
    TimedOut,
    Shutdown,
    /// The readiness wait itself fails.
    WaitError(io::ErrorKind),
}

/// A notification channel driven by a script instead of the kernel.
///
/// - Ids are handed out as 1, 2, 3, ... in registration order; registering
///   the same path again returns its existing id.
/// - Paths marked with [`FakeChannel::reject`] fail with `NotFound`.
/// - Once the script runs out, waits report `Shutdown` so loops end.
#[derive(Debug, Default)]
pub struct FakeChannel {
    next_id: i32,
    ids: HashMap<PathBuf, WatchId>,
    rejected: HashSet<PathBuf>,
    script: VecDeque<Step>,
    removed: Vec<WatchId>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(mut self, path: impl AsRef<Path>) -> Self {
        self.rejected.insert(path.as_ref().to_path_buf());
        self
    }

    pub fn then(mut self, step: Step) -> Self {
        self.script.push_back(step);
        self
    }

    pub fn then_ready(self, bytes: Vec<u8>) -> Self {
        self.then(Step::Ready(bytes))
    }

    pub fn id_of(&self, path: impl AsRef<Path>) -> Option<WatchId> {
        self.ids.get(path.as_ref()).copied()
    }

    /// Ids passed to `remove_watch`, in call order.
    pub fn removed(&self) -> &[WatchId] {
        &self.removed
    }

    pub fn remaining_steps(&self) -> usize {
        self.script.len()
    }
}

impl NotifyChannel for FakeChannel {
    fn add_watch(&mut self, path: &Path, _mask: EventMask) -> io::Result<WatchId> {
        if self.rejected.contains(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "scripted rejection"));
        }
        if let Some(id) = self.ids.get(path) {
            return Ok(*id);
        }
        self.next_id += 1;
        let id = WatchId::new(self.next_id);
        self.ids.insert(path.to_path_buf(), id);
        debug!(%id, ?path, "fake watch added");
        Ok(id)
    }

    fn remove_watch(&mut self, id: WatchId) -> io::Result<()> {
        self.removed.push(id);
        if self.ids.values().any(|v| *v == id) {
            self.ids.retain(|_, v| *v != id);
            Ok(())
        } else {
            Err(io::Error::from_raw_os_error(22))
        }
    }

    fn wait_ready(&mut self, _timeout: Option<Duration>) -> Result<Readiness> {
        match self.script.front() {
            None => Ok(Readiness::Shutdown),
            Some(Step::Ready(_)) | Some(Step::ReadError(_)) => Ok(Readiness::Ready),
            Some(Step::TimedOut) => {
                self.script.pop_front();
                Ok(Readiness::TimedOut)
            }
            Some(Step::Shutdown) => {
                self.script.pop_front();
                Ok(Readiness::Shutdown)
            }
            Some(Step::WaitError(kind)) => {
                let kind = *kind;
                self.script.pop_front();
                Err(WatchcmdError::Multiplex(io::Error::from(kind)))
            }
        }
    }

    fn read_events(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.pop_front() {
            Some(Step::Ready(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Step::ReadError(kind)) => Err(io::Error::from(kind)),
            other => Err(io::Error::other(format!(
                "read without a scripted ready step (next: {other:?})"
            ))),
        }
    }
}
