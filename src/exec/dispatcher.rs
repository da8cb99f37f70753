// src/exec/dispatcher.rs

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{Result, WatchcmdError};
use crate::exec::backend::{CommandOutcome, CommandRunner};
use crate::types::EventRecord;

/// Runs the configured command once per non-empty batch of events.
///
/// A batch is everything decoded from one read; however many records it
/// holds, the command runs exactly once for it.
#[derive(Debug)]
pub struct Dispatcher<R: CommandRunner> {
    command: String,
    runner: R,
    batches_dispatched: u64,
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn new(command: impl Into<String>, runner: R) -> Self {
        Self {
            command: command.into(),
            runner,
            batches_dispatched: 0,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Number of batches that reached the runner so far.
    pub fn batches_dispatched(&self) -> u64 {
        self.batches_dispatched
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the command for `events`.
    ///
    /// - Empty batch: `Ok(None)`, the runner is not touched.
    /// - Otherwise: `Ok(Some(outcome))`, where a failed outcome is logged
    ///   but not turned into an error.
    /// - `Err(WatchcmdError::Dispatch)` if the command could not be run.
    pub fn dispatch(&mut self, events: &[EventRecord]) -> Result<Option<CommandOutcome>> {
        if events.is_empty() {
            return Ok(None);
        }

        self.batches_dispatched += 1;

        let changed: BTreeSet<&Path> = events
            .iter()
            .filter(|e| e.is_resolved())
            .map(|e| e.path.as_path())
            .collect();
        debug!(
            batch = self.batches_dispatched,
            events = events.len(),
            ?changed,
            "dispatching batch"
        );

        let outcome = self
            .runner
            .run(&self.command)
            .map_err(|source| WatchcmdError::Dispatch {
                command: self.command.clone(),
                source,
            })?;

        match outcome {
            CommandOutcome::Success => {
                info!(batch = self.batches_dispatched, "command succeeded");
            }
            CommandOutcome::Failed(code) => {
                warn!(
                    batch = self.batches_dispatched,
                    exit_code = code,
                    "command failed; still watching"
                );
            }
        }

        Ok(Some(outcome))
    }
}
