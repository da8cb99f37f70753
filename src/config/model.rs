// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::{EventMask, WatchedEvent};

/// Watch list as read from disk, before validation.
///
/// TOML form:
///
/// ```toml
/// watch = ["notes.txt", "/etc/hosts"]
///
/// [config]
/// events = ["modify"]
/// wait_timeout_ms = 500
/// ```
///
/// JSON form is a bare array of paths and always uses the default
/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWatchList {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub watch: Vec<String>,
}

impl RawWatchList {
    pub fn from_paths(paths: Vec<String>) -> Self {
        Self {
            config: ConfigSection::default(),
            watch: paths,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Which changes to subscribe to. Defaults to `["modify"]`.
    #[serde(default = "default_events")]
    pub events: Vec<WatchedEvent>,

    /// Upper bound for one readiness wait. `None` blocks until an event or
    /// a shutdown request arrives.
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,

    /// Size of the buffer handed to each read. Raised to the minimum that
    /// fits one maximum-size record if smaller.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,
}

fn default_events() -> Vec<WatchedEvent> {
    vec![WatchedEvent::Modify]
}

fn default_read_buffer_bytes() -> usize {
    4096
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            events: default_events(),
            wait_timeout_ms: None,
            read_buffer_bytes: default_read_buffer_bytes(),
        }
    }
}

impl ConfigSection {
    pub fn event_mask(&self) -> EventMask {
        WatchedEvent::combined_mask(&self.events)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}

/// Validated watch list. Only produced through `TryFrom<RawWatchList>`.
#[derive(Debug, Clone)]
pub struct WatchList {
    pub config: ConfigSection,
    paths: Vec<PathBuf>,
}

impl WatchList {
    pub(crate) fn new_unchecked(config: ConfigSection, paths: Vec<PathBuf>) -> Self {
        Self { config, paths }
    }

    /// Paths in file order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Anchor relative entries at `base`. Absolute entries are untouched.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        for path in self.paths.iter_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
