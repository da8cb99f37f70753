// tests/watcher_status.rs

use watchcmd::engine::{FailureReason, StatusEvent, TerminationReason, WatcherStatus};

use watchcmd::engine::StatusEvent as E;
use watchcmd::engine::WatcherStatus as S;

fn walk(events: &[StatusEvent]) -> Option<WatcherStatus> {
    events
        .iter()
        .try_fold(WatcherStatus::default(), |status, ev| status.on(*ev))
}

#[test]
fn happy_path_cycles_back_to_registered() {
    let end = walk(&[
        E::ChannelOpened,
        E::RegistrationFinished { active_watches: 2 },
        E::WaitStarted,
        E::EventsReady,
        E::CycleFinished {
            active_watches: 2,
            stop_requested: false,
        },
        E::WaitStarted,
        E::WaitTimedOut,
    ]);
    assert_eq!(end, Some(S::Registered));
}

#[test]
fn open_failure_is_fatal() {
    assert_eq!(
        S::Uninitialized.on(E::ChannelOpenFailed),
        Some(S::Failed(FailureReason::ChannelOpen))
    );
}

#[test]
fn zero_watches_after_registration_is_fatal() {
    let end = walk(&[
        E::ChannelOpened,
        E::RegistrationFinished { active_watches: 0 },
    ]);
    assert_eq!(end, Some(S::Failed(FailureReason::NoActiveWatches)));
}

#[test]
fn multiplex_failure_is_fatal() {
    assert_eq!(
        S::AwaitingEvents.on(E::MultiplexFailed),
        Some(S::Failed(FailureReason::Multiplex))
    );
}

#[test]
fn last_watch_gone_terminates_after_the_cycle() {
    let next = S::EventsReady.on(E::CycleFinished {
        active_watches: 0,
        stop_requested: false,
    });
    assert_eq!(next, Some(S::Terminated(TerminationReason::NoActiveWatches)));

    // Running out of watches wins over a batch limit.
    let next = S::EventsReady.on(E::CycleFinished {
        active_watches: 0,
        stop_requested: true,
    });
    assert_eq!(next, Some(S::Terminated(TerminationReason::NoActiveWatches)));
}

#[test]
fn batch_limit_terminates_cleanly() {
    let next = S::EventsReady.on(E::CycleFinished {
        active_watches: 1,
        stop_requested: true,
    });
    assert_eq!(next, Some(S::Terminated(TerminationReason::BatchLimitReached)));
}

#[test]
fn shutdown_while_waiting_terminates() {
    assert_eq!(
        S::AwaitingEvents.on(E::ShutdownRequested),
        Some(S::Terminated(TerminationReason::ShutdownRequested))
    );
}

#[test]
fn out_of_order_events_are_rejected() {
    assert_eq!(S::Uninitialized.on(E::WaitStarted), None);
    assert_eq!(S::Initialized.on(E::EventsReady), None);
    assert_eq!(
        S::Registered.on(E::CycleFinished {
            active_watches: 1,
            stop_requested: false
        }),
        None
    );
    assert_eq!(S::EventsReady.on(E::WaitStarted), None);
}

#[test]
fn terminal_states_accept_nothing() {
    let terminal = [
        S::Terminated(TerminationReason::ShutdownRequested),
        S::Failed(FailureReason::Multiplex),
    ];
    let all_events = [
        E::ChannelOpened,
        E::ChannelOpenFailed,
        E::RegistrationFinished { active_watches: 1 },
        E::WaitStarted,
        E::WaitTimedOut,
        E::EventsReady,
        E::MultiplexFailed,
        E::ShutdownRequested,
        E::CycleFinished {
            active_watches: 1,
            stop_requested: false,
        },
    ];

    for status in terminal {
        assert!(status.is_terminal());
        for ev in all_events {
            assert_eq!(status.on(ev), None, "{status:?} accepted {ev:?}");
        }
    }
    assert!(!S::Registered.is_terminal());
}
