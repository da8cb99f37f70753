// src/types.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Deserialize;

/// Opaque handle returned by the notification subsystem for one watched path.
///
/// Values are only unique while the watch is active. The kernel may hand the
/// same number out again after a watch is removed, so nothing may assume they
/// grow monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(i32);

impl WatchId {
    pub const fn new(raw: i32) -> Self {
        WatchId(raw)
    }

    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Change-type bits as they appear in the wire header.
    ///
    /// Numeric values match `<sys/inotify.h>`, so the decoder can work on
    /// raw buffers without touching `libc`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const ACCESS        = 0x0000_0001;
        const MODIFY        = 0x0000_0002;
        const ATTRIB        = 0x0000_0004;
        const CLOSE_WRITE   = 0x0000_0008;
        const CLOSE_NOWRITE = 0x0000_0010;
        const OPEN          = 0x0000_0020;
        const MOVED_FROM    = 0x0000_0040;
        const MOVED_TO      = 0x0000_0080;
        const CREATE        = 0x0000_0100;
        const DELETE        = 0x0000_0200;
        const DELETE_SELF   = 0x0000_0400;
        const MOVE_SELF     = 0x0000_0800;
        const UNMOUNT       = 0x0000_2000;
        const Q_OVERFLOW    = 0x0000_4000;
        const IGNORED       = 0x0000_8000;
        const ISDIR         = 0x4000_0000;
    }
}

/// What happened to a watched path, as far as the dispatcher cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Modified,
    Deleted,
    /// The kernel dropped the watch (file removed, filesystem unmounted, or
    /// explicit removal). The id is no longer active after this record.
    WatchRemoved,
    /// Bits we don't translate. Still dispatched.
    Unknown,
}

impl EventKind {
    /// Total mapping from a raw mask to a kind.
    ///
    /// Checked from most to least final: a record carrying both `IGNORED`
    /// and anything else is reported as `WatchRemoved`.
    pub fn from_mask(mask: EventMask) -> Self {
        if mask.contains(EventMask::IGNORED) {
            EventKind::WatchRemoved
        } else if mask.intersects(
            EventMask::DELETE | EventMask::DELETE_SELF | EventMask::MOVE_SELF | EventMask::UNMOUNT,
        ) {
            EventKind::Deleted
        } else if mask.intersects(EventMask::MODIFY | EventMask::CLOSE_WRITE | EventMask::ATTRIB) {
            EventKind::Modified
        } else {
            EventKind::Unknown
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Modified => "modified",
            EventKind::Deleted => "deleted",
            EventKind::WatchRemoved => "watch-removed",
            EventKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One decoded notification.
///
/// Built fresh for every wire record and dropped at the start of the next
/// wake-up cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub watch_id: WatchId,
    pub kind: EventKind,
    pub mask: EventMask,
    /// Pairs related rename events. Carried through, never interpreted.
    pub cookie: u32,
    /// Path the watch was registered for. Empty when the id is unknown to
    /// the registry.
    pub path: PathBuf,
    /// Entry name inside a watched directory, NUL padding removed.
    pub name: Option<String>,
}

impl EventRecord {
    pub fn is_resolved(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }
}

/// Event classes selectable from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedEvent {
    Modify,
    CloseWrite,
    Attrib,
    DeleteSelf,
    MoveSelf,
}

impl WatchedEvent {
    pub fn mask(self) -> EventMask {
        match self {
            WatchedEvent::Modify => EventMask::MODIFY,
            WatchedEvent::CloseWrite => EventMask::CLOSE_WRITE,
            WatchedEvent::Attrib => EventMask::ATTRIB,
            WatchedEvent::DeleteSelf => EventMask::DELETE_SELF,
            WatchedEvent::MoveSelf => EventMask::MOVE_SELF,
        }
    }

    /// Union of the masks for a set of events.
    pub fn combined_mask(events: &[WatchedEvent]) -> EventMask {
        events
            .iter()
            .fold(EventMask::empty(), |acc, ev| acc | ev.mask())
    }
}

impl FromStr for WatchedEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modify" => Ok(WatchedEvent::Modify),
            "close_write" => Ok(WatchedEvent::CloseWrite),
            "attrib" => Ok(WatchedEvent::Attrib),
            "delete_self" => Ok(WatchedEvent::DeleteSelf),
            "move_self" => Ok(WatchedEvent::MoveSelf),
            other => Err(format!(
                "invalid event: {other} (expected one of \"modify\", \"close_write\", \"attrib\", \"delete_self\", \"move_self\")"
            )),
        }
    }
}

impl fmt::Display for WatchedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchedEvent::Modify => "modify",
            WatchedEvent::CloseWrite => "close_write",
            WatchedEvent::Attrib => "attrib",
            WatchedEvent::DeleteSelf => "delete_self",
            WatchedEvent::MoveSelf => "move_self",
        };
        f.write_str(s)
    }
}
