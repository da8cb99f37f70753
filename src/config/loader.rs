// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWatchList, WatchList};
use crate::errors::Result;

/// Load a watch list from a given path and return the raw `RawWatchList`.
///
/// Files ending in `.json` are read as a bare JSON array of paths; anything
/// else is parsed as TOML. No semantic validation happens here; use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWatchList> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw = if is_json {
        let paths: Vec<String> = serde_json::from_str(&contents)?;
        RawWatchList::from_paths(paths)
    } else {
        toml::from_str(&contents)?
    };

    Ok(raw)
}

/// Load a watch list from path, validate it, and anchor relative entries
/// at the directory holding the file.
///
/// The returned list only contains absolute paths, which is what the
/// registry stores.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatchList> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let list = WatchList::try_from(raw)?;
    Ok(list.resolve_relative_to(&config_root_dir(path)))
}

/// Directory that relative watch entries are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "conf/watch.toml"),
///   that directory is used, made absolute against the current directory.
/// - A bare filename like "watch.toml" falls back to the current directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            if parent.is_absolute() {
                parent.to_path_buf()
            } else {
                cwd.join(parent)
            }
        }
        _ => cwd,
    }
}
