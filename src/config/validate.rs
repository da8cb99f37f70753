// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::warn;

use crate::config::model::{RawWatchList, WatchList};
use crate::errors::{Result, WatchcmdError};

impl TryFrom<RawWatchList> for WatchList {
    type Error = crate::errors::WatchcmdError;

    fn try_from(raw: RawWatchList) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let paths = dedup_entries(&raw.watch);
        Ok(WatchList::new_unchecked(raw.config, paths))
    }
}

fn validate_raw_config(cfg: &RawWatchList) -> Result<()> {
    ensure_has_entries(cfg)?;
    validate_entries(cfg)?;
    validate_global_config(cfg)?;
    Ok(())
}

fn ensure_has_entries(cfg: &RawWatchList) -> Result<()> {
    if cfg.watch.is_empty() {
        return Err(WatchcmdError::ConfigError(
            "watch list must contain at least one path".to_string(),
        ));
    }
    Ok(())
}

fn validate_entries(cfg: &RawWatchList) -> Result<()> {
    for (idx, entry) in cfg.watch.iter().enumerate() {
        if entry.trim().is_empty() {
            return Err(WatchcmdError::ConfigError(format!(
                "watch entry #{} is blank",
                idx + 1
            )));
        }
        if entry.contains('\0') {
            return Err(WatchcmdError::ConfigError(format!(
                "watch entry #{} contains a NUL byte",
                idx + 1
            )));
        }
    }
    Ok(())
}

fn validate_global_config(cfg: &RawWatchList) -> Result<()> {
    // Event names are strongly typed and rejected during deserialization.
    if cfg.config.events.is_empty() {
        return Err(WatchcmdError::ConfigError(
            "[config].events must name at least one event".to_string(),
        ));
    }

    if cfg.config.wait_timeout_ms == Some(0) {
        return Err(WatchcmdError::ConfigError(
            "[config].wait_timeout_ms must be >= 1 (got 0); omit it to wait indefinitely"
                .to_string(),
        ));
    }

    Ok(())
}

fn dedup_entries(entries: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(entry.as_str()) {
            out.push(PathBuf::from(entry));
        } else {
            warn!(path = %entry, "duplicate watch entry ignored");
        }
    }
    out
}
