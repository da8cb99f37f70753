// src/config/mod.rs

//! Watch-list loading and validation.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a watch list from disk, TOML or JSON (`loader.rs`).
//! - Validate entries and settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, load_and_validate, load_from_path};
pub use model::{ConfigSection, RawWatchList, WatchList};
