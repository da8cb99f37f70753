use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use watchcmd::exec::{CommandOutcome, CommandRunner};

/// Scripted result for one invocation.
#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    Outcome(CommandOutcome),
    /// Behave as if the command could not be spawned.
    SpawnError,
}

/// A fake runner that:
/// - records every command it was asked to run
/// - returns scripted outcomes in order, then `Success`.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    executed: Arc<Mutex<Vec<String>>>,
    script: VecDeque<Scripted>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share the invocation log with the test.
    pub fn with_log(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            script: VecDeque::new(),
        }
    }

    pub fn then(mut self, next: Scripted) -> Self {
        self.script.push_back(next);
        self
    }

    pub fn calls(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, command: &str) -> io::Result<CommandOutcome> {
        self.executed.lock().unwrap().push(command.to_string());
        match self.script.pop_front() {
            None => Ok(CommandOutcome::Success),
            Some(Scripted::Outcome(outcome)) => Ok(outcome),
            Some(Scripted::SpawnError) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "scripted spawn failure",
            )),
        }
    }
}
