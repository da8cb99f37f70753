// src/exec/backend.rs

//! Pluggable command runner.
//!
//! The dispatcher talks to a `CommandRunner` instead of spawning processes
//! itself. This makes it easy to swap in a fake runner in tests while
//! keeping the production implementation here.
//!
//! - `ShellCommandRunner` is the default implementation used by `watchcmd`.
//!   It runs the command through `sh -c` and blocks until it
//!   exits.
//! - Tests can provide their own `CommandRunner` that records invocations
//!   and returns a scripted outcome.

use std::io;
use std::process::{Command, Stdio};

use tracing::{debug, info};

/// Outcome of one command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit, or `-1` when no exit code is available (e.g. the
    /// process was killed by a signal).
    Failed(i32),
}

impl CommandOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}

/// Trait abstracting how the configured command is executed.
pub trait CommandRunner {
    /// Run `command` to completion and report how it exited.
    ///
    /// `Err` means the command could not be started or waited on at all.
    fn run(&mut self, command: &str) -> io::Result<CommandOutcome>;
}

/// Runs commands via `sh -c`, inheriting stdin, stdout and
/// stderr from `watchcmd`.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&mut self, command: &str) -> io::Result<CommandOutcome> {
        info!(cmd = %command, "starting command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status()?;

        let code = status.code().unwrap_or(-1);
        let outcome = if status.success() {
            CommandOutcome::Success
        } else {
            CommandOutcome::Failed(code)
        };

        debug!(
            cmd = %command,
            exit_code = code,
            success = status.success(),
            "command exited"
        );

        Ok(outcome)
    }
}
