// src/engine/watcher.rs

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use crate::config::ConfigSection;
use crate::errors::{Result, WatchcmdError};
use crate::exec::{CommandOutcome, CommandRunner, Dispatcher};
use crate::types::{EventKind, EventMask, EventRecord, WatchId};
use crate::watch::{NotifyChannel, RawEventBuffer, Readiness, WatchRegistry, decode};

use super::status::{StatusEvent, TerminationReason, WatcherStatus};

/// Knobs for one watcher instance.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub mask: EventMask,
    /// Upper bound on each readiness wait; `None` waits indefinitely.
    pub wait_timeout: Option<Duration>,
    pub read_buffer_bytes: usize,
    /// Stop cleanly after the first dispatched batch.
    pub stop_after_first_batch: bool,
}

impl WatcherOptions {
    pub fn from_config(config: &ConfigSection) -> Self {
        Self {
            mask: config.event_mask(),
            wait_timeout: config.wait_timeout(),
            read_buffer_bytes: config.read_buffer_bytes,
            stop_after_first_batch: false,
        }
    }

    pub fn stop_after_first_batch(mut self, yes: bool) -> Self {
        self.stop_after_first_batch = yes;
        self
    }
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self::from_config(&ConfigSection::default())
    }
}

/// What the dispatcher did with a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// Empty batch; nothing was run.
    Skipped,
    Completed(CommandOutcome),
    /// The command could not be started.
    Failed,
}

/// Summary of one ready cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub bytes_read: usize,
    pub events: usize,
    pub truncated: bool,
    pub unresolved: usize,
    pub dispatch: DispatchResult,
    /// Watches the kernel dropped during this cycle.
    pub watches_removed: usize,
}

/// Result of one wake-up of the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    TimedOut,
    Shutdown,
    /// The read failed; nothing was decoded or dispatched.
    ReadFailed,
    Batch(BatchReport),
}

/// Counters kept across the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub events: u64,
    pub batches: u64,
    pub failed_commands: u64,
    pub read_errors: u64,
    pub truncated_buffers: u64,
    pub termination: Option<TerminationReason>,
}

/// Orchestrator: owns the channel, the registry and the pending-event
/// buffer, and drives wait -> read -> decode -> dispatch until no watches
/// remain.
///
/// Everything runs on the calling thread. The only blocking point is the
/// channel's readiness wait (plus the dispatched command itself).
pub struct Watcher<C: NotifyChannel, R: CommandRunner> {
    status: WatcherStatus,
    channel: Option<C>,
    registry: WatchRegistry,
    buffer: RawEventBuffer,
    pending: Vec<EventRecord>,
    dispatcher: Dispatcher<R>,
    options: WatcherOptions,
    summary: RunSummary,
}

impl<C: NotifyChannel, R: CommandRunner> fmt::Debug for Watcher<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("status", &self.status)
            .field("registry", &self.registry)
            .field("pending", &self.pending.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: NotifyChannel, R: CommandRunner> Watcher<C, R> {
    pub fn new(command: impl Into<String>, runner: R, options: WatcherOptions) -> Self {
        Self {
            status: WatcherStatus::Uninitialized,
            channel: None,
            registry: WatchRegistry::new(),
            buffer: RawEventBuffer::with_capacity(options.read_buffer_bytes),
            pending: Vec::new(),
            dispatcher: Dispatcher::new(command, runner),
            options,
            summary: RunSummary::default(),
        }
    }

    pub fn status(&self) -> WatcherStatus {
        self.status
    }

    pub fn channel(&self) -> Option<&C> {
        self.channel.as_ref()
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Events decoded in the most recent ready cycle.
    pub fn pending_events(&self) -> &[EventRecord] {
        &self.pending
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Open the notification channel.
    ///
    /// A failure leaves the watcher in `Failed(ChannelOpen)`.
    pub fn open_with<F>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce() -> io::Result<C>,
    {
        match open() {
            Ok(channel) => {
                self.transition(StatusEvent::ChannelOpened)?;
                self.channel = Some(channel);
                debug!("notification channel opened");
                Ok(())
            }
            Err(err) => {
                self.transition(StatusEvent::ChannelOpenFailed)?;
                let err = WatchcmdError::ChannelOpen(err);
                error!(error = %err, "cannot start watching");
                Err(err)
            }
        }
    }

    /// Register every path, skipping the ones the channel rejects.
    ///
    /// Returns the number of paths registered in this call. Fails with
    /// [`WatchcmdError::NoActiveWatches`] if the registry is empty
    /// afterwards.
    pub fn register_all(&mut self, paths: &[PathBuf]) -> Result<usize> {
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| WatchcmdError::Other(anyhow!("notification channel is not open")))?;

        let mut registered = 0usize;
        for path in paths {
            match self.registry.register(channel, path, self.options.mask) {
                Ok(_) => registered += 1,
                Err(err) => warn!(error = %err, "skipping path"),
            }
        }

        let active_watches = self.registry.count();
        self.transition(StatusEvent::RegistrationFinished { active_watches })?;

        if active_watches == 0 {
            let err = WatchcmdError::NoActiveWatches;
            error!(error = %err, requested = paths.len(), "cannot start watching");
            return Err(err);
        }

        info!(count = active_watches, "watching files");
        for path in self.registry.all_paths() {
            info!("  - {}", path.display());
        }

        Ok(registered)
    }

    /// Main loop. Runs cycles until a terminal state is reached.
    ///
    /// Per-cycle problems (read failures, truncated buffers, failed
    /// commands) are logged and the loop carries on; a readiness-wait
    /// failure ends it with an error.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.status != WatcherStatus::Registered {
            return Err(WatchcmdError::Other(anyhow!(
                "watcher cannot run from status {:?}",
                self.status
            )));
        }

        info!(cmd = %self.dispatcher.command(), "watch loop started");

        while !self.status.is_terminal() {
            self.run_cycle()?;
        }

        if let WatcherStatus::Terminated(reason) = self.status {
            self.summary.termination = Some(reason);
            info!(?reason, "watch loop finished");
        }
        self.close();

        Ok(self.summary.clone())
    }

    /// One wake-up: wait, then read, decode and dispatch if data arrived.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.pending.clear();
        self.transition(StatusEvent::WaitStarted)?;
        self.summary.cycles += 1;

        let timeout = self.options.wait_timeout;
        let readiness = match self.channel.as_mut() {
            Some(channel) => channel.wait_ready(timeout),
            None => Err(WatchcmdError::Other(anyhow!("notification channel is not open"))),
        };

        let readiness = match readiness {
            Ok(r) => r,
            Err(err) => {
                self.transition(StatusEvent::MultiplexFailed)?;
                error!(error = %err, "readiness wait failed; stopping");
                return Err(err);
            }
        };

        match readiness {
            Readiness::TimedOut => {
                self.transition(StatusEvent::WaitTimedOut)?;
                debug!("readiness wait timed out");
                return Ok(CycleOutcome::TimedOut);
            }
            Readiness::Shutdown => {
                self.transition(StatusEvent::ShutdownRequested)?;
                info!("shutdown requested");
                return Ok(CycleOutcome::Shutdown);
            }
            Readiness::Ready => {
                self.transition(StatusEvent::EventsReady)?;
            }
        }

        let read = match self.channel.as_mut() {
            Some(channel) => self.buffer.fill_with(|buf| channel.read_events(buf)),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "channel closed")),
        };

        let bytes_read = match read {
            Ok(n) => n,
            Err(source) => {
                self.summary.read_errors += 1;
                warn!(error = %WatchcmdError::Read(source), "skipping this cycle");
                self.finish_cycle(false)?;
                return Ok(CycleOutcome::ReadFailed);
            }
        };

        let report = self.process_buffer(bytes_read);
        self.finish_cycle(report.dispatch != DispatchResult::Skipped)?;

        Ok(CycleOutcome::Batch(report))
    }

    /// Stop watching `id` and release its kernel-side watch.
    ///
    /// The kernel's `IN_IGNORED` for this id is swallowed when it arrives,
    /// so it neither triggers the command nor shows up as an unknown id.
    pub fn unwatch(&mut self, id: WatchId) -> Result<Option<PathBuf>> {
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| WatchcmdError::Other(anyhow!("notification channel is not open")))?;
        let removed = self.registry.remove(channel, id)?;
        if let Some(path) = &removed {
            info!(%id, path = %path.display(), "stopped watching");
        }
        Ok(removed)
    }

    /// Close the channel, which releases every kernel-side watch.
    pub fn close(&mut self) {
        if self.channel.take().is_some() {
            debug!(active = self.registry.count(), "notification channel closed");
        }
    }

    fn process_buffer(&mut self, bytes_read: usize) -> BatchReport {
        let mut decoded = decode(self.buffer.filled(), bytes_read, &self.registry);

        let registry = &mut self.registry;
        decoded.events.retain(|e| {
            !(e.kind == EventKind::WatchRemoved && registry.acknowledge_removal(e.watch_id))
        });
        let events = &decoded.events;
        decoded
            .unresolved
            .retain(|id| events.iter().any(|e| e.watch_id == *id));

        for id in &decoded.unresolved {
            warn!(error = %WatchcmdError::UnresolvedWatchId(*id), "event kept with empty path");
        }
        if let Some(truncated) = decoded.truncated {
            self.summary.truncated_buffers += 1;
            warn!(
                error = %WatchcmdError::from(truncated),
                "dropping rest of buffer; dispatching decoded events"
            );
        }
        if decoded
            .events
            .iter()
            .any(|e| e.mask.contains(EventMask::Q_OVERFLOW))
        {
            warn!("kernel event queue overflowed; some changes were not reported");
        }

        self.pending = decoded.events;
        self.summary.events += self.pending.len() as u64;

        for event in &self.pending {
            info!(
                kind = %event.kind,
                path = %event.path.display(),
                name = event.name.as_deref().unwrap_or(""),
                "new event"
            );
        }

        let dispatch = match self.dispatcher.dispatch(&self.pending) {
            Ok(None) => DispatchResult::Skipped,
            Ok(Some(outcome)) => {
                self.summary.batches += 1;
                if !outcome.is_success() {
                    self.summary.failed_commands += 1;
                }
                DispatchResult::Completed(outcome)
            }
            Err(err) => {
                self.summary.batches += 1;
                self.summary.failed_commands += 1;
                warn!(error = %err, "still watching");
                DispatchResult::Failed
            }
        };

        // The batch is dispatched before any dropped watch leaves the
        // registry, so its records still resolve.
        let removed: Vec<WatchId> = self
            .pending
            .iter()
            .filter(|e| e.kind == EventKind::WatchRemoved)
            .map(|e| e.watch_id)
            .collect();
        let mut watches_removed = 0;
        for id in removed {
            if let Some(path) = self.registry.forget(id) {
                watches_removed += 1;
                info!(%id, path = %path.display(), "watch dropped by the kernel");
            }
        }

        BatchReport {
            bytes_read,
            events: self.pending.len(),
            truncated: decoded.truncated.is_some(),
            unresolved: decoded.unresolved.len(),
            dispatch,
            watches_removed,
        }
    }

    fn finish_cycle(&mut self, dispatched: bool) -> Result<()> {
        let stop_requested = dispatched && self.options.stop_after_first_batch;
        self.transition(StatusEvent::CycleFinished {
            active_watches: self.registry.count(),
            stop_requested,
        })
    }

    fn transition(&mut self, event: StatusEvent) -> Result<()> {
        match self.status.on(event) {
            Some(next) => {
                debug!(from = ?self.status, to = ?next, ?event, "status transition");
                self.status = next;
                Ok(())
            }
            None => Err(WatchcmdError::Other(anyhow!(
                "invalid watcher transition {:?} from {:?}",
                event,
                self.status
            ))),
        }
    }
}
