// src/errors.rs

//! Crate-wide error type.
//!
//! Variants are split by how far they propagate. Only the fatal set
//! (see [`WatchcmdError::is_fatal`]) stops the watcher; everything else is
//! scoped to one path, one read cycle or one record and is logged by the
//! orchestrator before it carries on.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::WatchId;

#[derive(Error, Debug)]
pub enum WatchcmdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to open notification channel: {0}")]
    ChannelOpen(#[source] std::io::Error),

    #[error("failed to watch {path:?}: {source}")]
    Registration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no paths could be watched")]
    NoActiveWatches,

    #[error("readiness wait failed: {0}")]
    Multiplex(#[source] std::io::Error),

    #[error("read from notification channel failed: {0}")]
    Read(#[source] std::io::Error),

    #[error(
        "truncated event record at offset {offset}: needs {needed} bytes, {available} available"
    )]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("event references unknown watch id {0}")]
    UnresolvedWatchId(WatchId),

    #[error("failed to run command '{command}': {source}")]
    Dispatch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchcmdError {
    /// Whether this error ends the whole run rather than a single cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WatchcmdError::ChannelOpen(_)
                | WatchcmdError::NoActiveWatches
                | WatchcmdError::Multiplex(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WatchcmdError>;
