// src/watch/registry.rs

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, WatchcmdError};
use crate::types::{EventMask, WatchId};
use crate::watch::channel::NotifyChannel;

/// Association between live watch ids and the path each one stands for.
///
/// Owned by exactly one watcher; never shared between instances. The
/// number of entries is the active-watch count the main loop terminates
/// on.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: HashMap<WatchId, PathBuf>,
    /// Ids removed on request whose `IN_IGNORED` has not arrived yet.
    retired: HashSet<WatchId>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` with `channel` and remember the returned id.
    ///
    /// If the channel hands back an id that is already live (the same file
    /// reached through another spelling or a symlink), the first path is
    /// kept and the call fails with a `Registration` error of kind
    /// `AlreadyExists`, so the active count only grows on new watches.
    pub fn register<C>(&mut self, channel: &mut C, path: &Path, mask: EventMask) -> Result<WatchId>
    where
        C: NotifyChannel + ?Sized,
    {
        let id = channel
            .add_watch(path, mask)
            .map_err(|source| WatchcmdError::Registration {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(existing) = self.entries.get(&id) {
            debug!(%id, ?path, ?existing, "watch id already live");
            return Err(WatchcmdError::Registration {
                path: path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("same watch as {}", existing.display()),
                ),
            });
        }

        self.retired.remove(&id);
        self.entries.insert(id, path.to_path_buf());
        debug!(%id, ?path, "watch registered");
        Ok(id)
    }

    pub fn resolve(&self, id: WatchId) -> Option<&Path> {
        self.entries.get(&id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: WatchId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of active watches.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All watched paths, sorted for stable output.
    pub fn all_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.entries.values().map(PathBuf::as_path).collect();
        paths.sort();
        paths
    }

    /// Remove a watch from both the registry and the channel.
    ///
    /// The registry entry is dropped even when the channel refuses, so the
    /// active count never includes an id we have given up on.
    pub fn remove<C>(&mut self, channel: &mut C, id: WatchId) -> Result<Option<PathBuf>>
    where
        C: NotifyChannel + ?Sized,
    {
        let Some(path) = self.entries.remove(&id) else {
            return Ok(None);
        };
        channel.remove_watch(id)?;
        self.retired.insert(id);
        debug!(%id, ?path, "watch removed");
        Ok(Some(path))
    }

    /// Consume the pending removal notice for `id`.
    ///
    /// Returns `true` exactly once per id removed through [`Self::remove`],
    /// which lets the orchestrator drop the kernel's follow-up
    /// `WatchRemoved` record instead of treating it as an unknown id.
    pub fn acknowledge_removal(&mut self, id: WatchId) -> bool {
        self.retired.remove(&id)
    }

    /// Drop an entry whose kernel-side watch is already gone.
    pub fn forget(&mut self, id: WatchId) -> Option<PathBuf> {
        let path = self.entries.remove(&id);
        if let Some(ref p) = path {
            debug!(%id, path = ?p, "watch forgotten");
        }
        path
    }
}
