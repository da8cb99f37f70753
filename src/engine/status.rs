// src/engine/status.rs

//! Pure watcher state machine.
//!
//! ```text
//! Uninitialized --open--> Initialized --register>=1--> Registered
//!                                                         |   ^
//!                                                    wait |   | timeout / cycle done
//!                                                         v   |
//!                                   AwaitingEvents --ready--> EventsReady
//! ```
//!
//! Terminal states: `Terminated(_)` for a clean stop, `Failed(_)` for the
//! fatal set (channel open failure, no watches after registration,
//! readiness wait failure). No IO happens here; the orchestrator feeds
//! [`StatusEvent`]s in and acts on the state that comes out.

/// Why the loop stopped cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Every watch went away.
    NoActiveWatches,
    /// A shutdown signal woke the readiness wait.
    ShutdownRequested,
    /// Single-batch mode finished its batch.
    BatchLimitReached,
}

/// Why the watcher could not continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    ChannelOpen,
    NoActiveWatches,
    Multiplex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherStatus {
    Uninitialized,
    Initialized,
    Registered,
    AwaitingEvents,
    EventsReady,
    Terminated(TerminationReason),
    Failed(FailureReason),
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    ChannelOpened,
    ChannelOpenFailed,
    /// Registration pass finished with this many active watches.
    RegistrationFinished { active_watches: usize },
    WaitStarted,
    WaitTimedOut,
    EventsReady,
    MultiplexFailed,
    ShutdownRequested,
    /// A ready cycle (read, decode, dispatch) is complete.
    CycleFinished {
        active_watches: usize,
        stop_requested: bool,
    },
}

impl WatcherStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WatcherStatus::Terminated(_) | WatcherStatus::Failed(_))
    }

    /// Next state, or `None` if `event` makes no sense in this state.
    pub fn on(self, event: StatusEvent) -> Option<WatcherStatus> {
        use StatusEvent as E;
        use WatcherStatus as S;

        let next = match (self, event) {
            (S::Uninitialized, E::ChannelOpened) => S::Initialized,
            (S::Uninitialized, E::ChannelOpenFailed) => S::Failed(FailureReason::ChannelOpen),

            // Registration may run more than once; an empty registry after
            // any pass is fatal.
            (S::Initialized | S::Registered, E::RegistrationFinished { active_watches }) => {
                if active_watches == 0 {
                    S::Failed(FailureReason::NoActiveWatches)
                } else {
                    S::Registered
                }
            }

            (S::Registered, E::WaitStarted) => S::AwaitingEvents,
            (S::AwaitingEvents, E::WaitTimedOut) => S::Registered,
            (S::AwaitingEvents, E::EventsReady) => S::EventsReady,
            (S::AwaitingEvents, E::MultiplexFailed) => S::Failed(FailureReason::Multiplex),
            (S::AwaitingEvents | S::Registered, E::ShutdownRequested) => {
                S::Terminated(TerminationReason::ShutdownRequested)
            }

            (
                S::EventsReady,
                E::CycleFinished {
                    active_watches,
                    stop_requested,
                },
            ) => {
                if active_watches == 0 {
                    S::Terminated(TerminationReason::NoActiveWatches)
                } else if stop_requested {
                    S::Terminated(TerminationReason::BatchLimitReached)
                } else {
                    S::Registered
                }
            }

            _ => return None,
        };

        Some(next)
    }
}

impl Default for WatcherStatus {
    fn default() -> Self {
        WatcherStatus::Uninitialized
    }
}
