// tests/watcher_cycles.rs

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use watchcmd::engine::{
    CycleOutcome, DispatchResult, FailureReason, TerminationReason, Watcher, WatcherOptions,
    WatcherStatus,
};
use watchcmd::errors::WatchcmdError;
use watchcmd::exec::CommandOutcome;
use watchcmd::types::{EventKind, EventMask, WatchId};
use watchcmd_test_utils::fake_channel::{FakeChannel, Step};
use watchcmd_test_utils::init_tracing;
use watchcmd_test_utils::records::RecordBuilder;
use watchcmd_test_utils::recording_runner::{RecordingRunner, Scripted};

type TestResult = Result<(), Box<dyn Error>>;
type TestWatcher = Watcher<FakeChannel, RecordingRunner>;

const A: &str = "/tmp/a.txt";
const B: &str = "/tmp/b.txt";

fn paths() -> Vec<PathBuf> {
    vec![PathBuf::from(A), PathBuf::from(B)]
}

/// Open and register `A` and `B` (ids 1 and 2) on `channel`.
fn registered(
    channel: FakeChannel,
    runner: RecordingRunner,
    options: WatcherOptions,
) -> Result<TestWatcher, WatchcmdError> {
    let mut watcher = Watcher::new("make", runner, options);
    watcher.open_with(|| Ok(channel))?;
    watcher.register_all(&paths())?;
    Ok(watcher)
}

fn modify(wd: i32) -> Vec<u8> {
    RecordBuilder::new().event(wd, EventMask::MODIFY).build()
}

#[test]
fn one_modify_runs_the_command_once_with_the_right_path() -> TestResult {
    init_tracing();

    let log = Arc::new(Mutex::new(Vec::new()));
    let channel = FakeChannel::new().then_ready(modify(1));
    let mut watcher = registered(
        channel,
        RecordingRunner::with_log(log.clone()),
        WatcherOptions::default(),
    )?;

    assert_eq!(watcher.status(), WatcherStatus::Registered);
    assert_eq!(watcher.registry().count(), 2);

    let outcome = watcher.run_cycle()?;
    let CycleOutcome::Batch(report) = outcome else {
        panic!("expected a batch");
    };

    assert_eq!(report.events, 1);
    assert_eq!(report.bytes_read, 16);
    assert_eq!(report.dispatch, DispatchResult::Completed(CommandOutcome::Success));
    assert!(!report.truncated);

    let events = watcher.pending_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].watch_id, WatchId::new(1));
    assert_eq!(events[0].kind, EventKind::Modified);
    assert_eq!(events[0].path, PathBuf::from(A));

    assert_eq!(*log.lock().unwrap(), vec!["make".to_string()]);
    assert_eq!(watcher.status(), WatcherStatus::Registered);
    Ok(())
}

#[test]
fn several_records_in_one_read_are_one_batch() -> TestResult {
    init_tracing();

    let bytes = RecordBuilder::new()
        .event(1, EventMask::MODIFY)
        .event(2, EventMask::CLOSE_WRITE)
        .event(1, EventMask::ATTRIB)
        .build();
    let channel = FakeChannel::new().then_ready(bytes);
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };

    assert_eq!(report.events, 3);
    assert_eq!(watcher.dispatcher().runner().calls(), 1);
    Ok(())
}

#[test]
fn run_stops_cleanly_on_shutdown() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new()
        .then_ready(modify(1))
        .then(Step::TimedOut)
        .then_ready(modify(2))
        .then(Step::Shutdown);
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let summary = watcher.run()?;

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.events, 2);
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.termination, Some(TerminationReason::ShutdownRequested));
    assert_eq!(
        watcher.status(),
        WatcherStatus::Terminated(TerminationReason::ShutdownRequested)
    );
    assert!(watcher.channel().is_none(), "channel released on exit");
    assert_eq!(watcher.dispatcher().runner().calls(), 2);
    Ok(())
}

#[test]
fn timeout_returns_to_waiting_without_dispatch() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new().then(Step::TimedOut).then_ready(modify(2));
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    assert_eq!(watcher.run_cycle()?, CycleOutcome::TimedOut);
    assert_eq!(watcher.status(), WatcherStatus::Registered);
    assert_eq!(watcher.dispatcher().runner().calls(), 0);

    assert!(matches!(watcher.run_cycle()?, CycleOutcome::Batch(_)));
    assert_eq!(watcher.pending_events()[0].path, PathBuf::from(B));
    Ok(())
}

#[test]
fn read_failure_skips_the_cycle_and_keeps_going() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new()
        .then(Step::ReadError(io::ErrorKind::Other))
        .then_ready(modify(1));
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    assert_eq!(watcher.run_cycle()?, CycleOutcome::ReadFailed);
    assert_eq!(watcher.status(), WatcherStatus::Registered);
    assert!(watcher.pending_events().is_empty());

    assert!(matches!(watcher.run_cycle()?, CycleOutcome::Batch(_)));
    assert_eq!(watcher.summary().read_errors, 1);
    assert_eq!(watcher.dispatcher().runner().calls(), 1);
    Ok(())
}

#[test]
fn truncated_buffer_still_dispatches_what_decoded() -> TestResult {
    init_tracing();

    let bytes = RecordBuilder::new()
        .event(1, EventMask::MODIFY)
        .header_only(2, EventMask::MODIFY, 0, 200)
        .build();
    let channel = FakeChannel::new().then_ready(bytes);
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };

    assert!(report.truncated);
    assert_eq!(report.events, 1);
    assert_eq!(report.dispatch, DispatchResult::Completed(CommandOutcome::Success));
    assert_eq!(watcher.summary().truncated_buffers, 1);
    Ok(())
}

#[test]
fn unknown_watch_id_is_kept_and_dispatched() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new().then_ready(modify(77));
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };

    assert_eq!(report.unresolved, 1);
    assert_eq!(report.events, 1);
    assert!(!watcher.pending_events()[0].is_resolved());
    assert_eq!(watcher.dispatcher().runner().calls(), 1);
    Ok(())
}

#[test]
fn empty_read_does_not_dispatch() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new().then_ready(Vec::new());
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };

    assert_eq!(report.events, 0);
    assert_eq!(report.dispatch, DispatchResult::Skipped);
    assert_eq!(watcher.dispatcher().runner().calls(), 0);
    Ok(())
}

#[test]
fn failing_or_unstartable_command_keeps_watching() -> TestResult {
    init_tracing();

    let runner = RecordingRunner::new()
        .then(Scripted::Outcome(CommandOutcome::Failed(1)))
        .then(Scripted::SpawnError);
    let channel = FakeChannel::new()
        .then_ready(modify(1))
        .then_ready(modify(1))
        .then_ready(modify(2));
    let mut watcher = registered(channel, runner, WatcherOptions::default())?;

    let summary = watcher.run()?;

    assert_eq!(summary.batches, 3);
    assert_eq!(summary.failed_commands, 2);
    assert_eq!(summary.termination, Some(TerminationReason::ShutdownRequested));
    Ok(())
}

#[test]
fn readiness_failure_is_fatal() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new().then(Step::WaitError(io::ErrorKind::Other));
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let err = watcher.run().expect_err("multiplex failure ends the run");

    assert!(matches!(err, WatchcmdError::Multiplex(_)));
    assert!(err.is_fatal());
    assert_eq!(watcher.status(), WatcherStatus::Failed(FailureReason::Multiplex));
    assert_eq!(watcher.dispatcher().runner().calls(), 0);
    Ok(())
}

#[test]
fn loop_ends_when_every_watch_is_dropped() -> TestResult {
    init_tracing();

    let first = RecordBuilder::new()
        .event(1, EventMask::DELETE_SELF)
        .event(1, EventMask::IGNORED)
        .build();
    let second = RecordBuilder::new().event(2, EventMask::IGNORED).build();
    let channel = FakeChannel::new()
        .then_ready(first)
        .then_ready(second)
        // Never reached.
        .then_ready(modify(1));
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };
    assert_eq!(report.watches_removed, 1);
    assert_eq!(watcher.registry().count(), 1);
    // Both records of the batch resolved before the watch was dropped.
    assert!(watcher.pending_events().iter().all(|e| e.path == PathBuf::from(A)));

    let summary = watcher.run()?;

    assert_eq!(summary.termination, Some(TerminationReason::NoActiveWatches));
    assert!(watcher.registry().is_empty());
    assert_eq!(watcher.dispatcher().runner().calls(), 2);
    Ok(())
}

#[test]
fn once_mode_stops_after_the_first_batch() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new()
        .then(Step::TimedOut)
        .then_ready(Vec::new())
        .then_ready(modify(1))
        .then_ready(modify(2));
    let options = WatcherOptions::default().stop_after_first_batch(true);
    let mut watcher = registered(channel, RecordingRunner::new(), options)?;

    let summary = watcher.run()?;

    assert_eq!(summary.termination, Some(TerminationReason::BatchLimitReached));
    assert_eq!(summary.batches, 1);
    assert_eq!(watcher.dispatcher().runner().calls(), 1);
    Ok(())
}

#[test]
fn channel_open_failure_is_fatal() {
    init_tracing();

    let mut watcher: TestWatcher =
        Watcher::new("make", RecordingRunner::new(), WatcherOptions::default());

    let err = watcher
        .open_with(|| Err(io::Error::from(io::ErrorKind::PermissionDenied)))
        .expect_err("open failure surfaces");

    assert!(matches!(err, WatchcmdError::ChannelOpen(_)));
    assert!(err.is_fatal());
    assert_eq!(watcher.status(), WatcherStatus::Failed(FailureReason::ChannelOpen));
}

#[test]
fn rejected_paths_are_skipped() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new().reject(A);
    let mut watcher: TestWatcher =
        Watcher::new("make", RecordingRunner::new(), WatcherOptions::default());
    watcher.open_with(|| Ok(channel))?;

    assert_eq!(watcher.register_all(&paths())?, 1);
    assert_eq!(watcher.registry().all_paths(), vec![std::path::Path::new(B)]);
    assert_eq!(watcher.status(), WatcherStatus::Registered);
    Ok(())
}

#[test]
fn no_registrable_path_is_fatal() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new().reject(A).reject(B);
    let mut watcher: TestWatcher =
        Watcher::new("make", RecordingRunner::new(), WatcherOptions::default());
    watcher.open_with(|| Ok(channel))?;

    let err = watcher
        .register_all(&paths())
        .expect_err("nothing to watch");

    assert!(matches!(err, WatchcmdError::NoActiveWatches));
    assert_eq!(
        watcher.status(),
        WatcherStatus::Failed(FailureReason::NoActiveWatches)
    );
    assert!(watcher.run().is_err(), "a failed watcher cannot run");
    Ok(())
}

#[test]
fn run_requires_registration_first() {
    init_tracing();

    let mut watcher: TestWatcher =
        Watcher::new("make", RecordingRunner::new(), WatcherOptions::default());

    assert!(watcher.run().is_err());
    assert_eq!(watcher.status(), WatcherStatus::Uninitialized);
}

#[test]
fn same_file_listed_twice_registers_once() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new();
    let mut watcher: TestWatcher =
        Watcher::new("make", RecordingRunner::new(), WatcherOptions::default());
    watcher.open_with(|| Ok(channel))?;

    let listed = [PathBuf::from(A), PathBuf::from(A), PathBuf::from(B)];
    let registered = watcher.register_all(&listed)?;

    assert_eq!(registered, 2);
    assert_eq!(registered, watcher.registry().count());
    assert_eq!(watcher.status(), WatcherStatus::Registered);
    Ok(())
}

#[test]
fn removal_notice_for_an_unwatched_id_is_swallowed() -> TestResult {
    init_tracing();

    let log = Arc::new(Mutex::new(Vec::new()));
    let channel = FakeChannel::new()
        .then_ready(RecordBuilder::new().event(1, EventMask::IGNORED).build())
        .then_ready(modify(2));
    let mut watcher = registered(
        channel,
        RecordingRunner::with_log(log.clone()),
        WatcherOptions::default(),
    )?;

    assert_eq!(watcher.unwatch(WatchId::new(1))?, Some(PathBuf::from(A)));
    assert_eq!(watcher.unwatch(WatchId::new(1))?, None);
    assert_eq!(watcher.registry().count(), 1);
    assert_eq!(
        watcher.channel().map(|c| c.removed().to_vec()),
        Some(vec![WatchId::new(1)])
    );

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };
    assert_eq!(report.events, 0);
    assert_eq!(report.unresolved, 0);
    assert_eq!(report.dispatch, DispatchResult::Skipped);
    assert_eq!(watcher.status(), WatcherStatus::Registered);
    assert_eq!(watcher.channel().map(FakeChannel::remaining_steps), Some(1));

    let CycleOutcome::Batch(report) = watcher.run_cycle()? else {
        panic!("expected a batch");
    };
    assert_eq!(report.events, 1);
    assert_eq!(watcher.pending_events()[0].path, PathBuf::from(B));
    assert_eq!(watcher.dispatcher().runner().commands(), vec!["make".to_string()]);
    assert_eq!(log.lock().unwrap().len(), 1);
    Ok(())
}

#[test]
fn removing_the_last_watch_ends_the_loop_after_its_notice() -> TestResult {
    init_tracing();

    let channel = FakeChannel::new()
        .then_ready(
            RecordBuilder::new()
                .event(1, EventMask::IGNORED)
                .event(2, EventMask::IGNORED)
                .build(),
        )
        .then_ready(modify(1));
    let mut watcher = registered(channel, RecordingRunner::new(), WatcherOptions::default())?;

    watcher.unwatch(WatchId::new(1))?;
    watcher.unwatch(WatchId::new(2))?;

    let summary = watcher.run()?;

    assert_eq!(summary.termination, Some(TerminationReason::NoActiveWatches));
    assert_eq!(summary.batches, 0);
    assert_eq!(watcher.dispatcher().runner().calls(), 0);
    Ok(())
}
