// src/exec/mod.rs

//! Command execution layer.
//!
//! - [`backend`] provides the `CommandRunner` trait and the production
//!   `ShellCommandRunner`, which tests replace with a fake.
//! - [`dispatcher`] applies the batching policy: one command run per
//!   non-empty batch of decoded events.

pub mod backend;
pub mod dispatcher;

pub use backend::{CommandOutcome, CommandRunner, ShellCommandRunner};
pub use dispatcher::Dispatcher;
