// src/engine/mod.rs

//! Orchestration for watchcmd.
//!
//! The pure state machine lives in [`status`]; the synchronous loop that
//! owns the channel, registry and dispatcher is [`watcher`].

pub mod status;
pub mod watcher;

pub use status::{FailureReason, StatusEvent, TerminationReason, WatcherStatus};
pub use watcher::{
    BatchReport, CycleOutcome, DispatchResult, RunSummary, Watcher, WatcherOptions,
};
