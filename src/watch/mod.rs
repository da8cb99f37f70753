// src/watch/mod.rs

//! The watch core.
//!
//! This module is responsible for:
//! - Tracking which watch id stands for which path (`registry`).
//! - Blocking until the notification channel has data (`multiplex`).
//! - Turning raw read buffers into structured events (`buffer`, `decoder`).
//! - The OS-facing channel itself (`channel`, `inotify`).
//!
//! It does **not** run commands; that is `exec`'s job.

pub mod buffer;
pub mod channel;
pub mod decoder;
pub mod inotify;
pub mod multiplex;
pub mod registry;

pub use buffer::{MAX_NAME_LEN, MIN_BUFFER_CAPACITY, RawEventBuffer};
pub use channel::{NotifyChannel, Readiness};
pub use decoder::{
    DecodeOutcome, ParsedBuffer, RawHeader, RawRecord, TruncatedRecord, decode, parse_records,
};
pub use inotify::InotifyChannel;
pub use multiplex::{ShutdownSignal, wait_ready};
pub use registry::WatchRegistry;
