// src/lib.rs

#[cfg(not(target_os = "linux"))]
compile_error!("watchcmd needs Linux inotify");

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod watch;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::WatchList;
use crate::config::loader::load_and_validate;
use crate::engine::{Watcher, WatcherOptions};
use crate::exec::ShellCommandRunner;
use crate::watch::{InotifyChannel, ShutdownSignal};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - watch-list loading
/// - the inotify channel and watch registration
/// - the synchronous watch loop (on a blocking thread)
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let list = load_and_validate(&args.config)
        .with_context(|| format!("loading watch list {:?}", args.config))?;

    if args.dry_run {
        print_dry_run(&list, &args.command);
        return Ok(());
    }

    let shutdown = ShutdownSignal::new().context("creating shutdown signal")?;

    // Ctrl-C / SIGTERM → wake the watch loop for a clean exit.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(()) => shutdown.trigger(),
                Err(e) => warn!("failed to listen for shutdown signals: {e}"),
            }
        });
    }

    let options = WatcherOptions::from_config(&list.config).stop_after_first_batch(args.once);
    let paths = list.paths().to_vec();
    let command = args.command.clone();

    let summary = tokio::task::spawn_blocking(move || {
        let mut watcher = Watcher::new(command, ShellCommandRunner::new(), options);
        watcher.open_with(|| InotifyChannel::open().map(|c| c.with_shutdown(shutdown)))?;
        watcher.register_all(&paths)?;
        watcher.run()
    })
    .await
    .context("watch loop thread panicked")??;

    info!(
        cycles = summary.cycles,
        batches = summary.batches,
        events = summary.events,
        failed_commands = summary.failed_commands,
        "watchcmd exiting"
    );
    Ok(())
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Ctrl+C detected; shutting down");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM detected; shutting down");
        }
    }
    Ok(())
}

/// Simple dry-run output: print the resolved watch list and command.
fn print_dry_run(list: &WatchList, command: &str) {
    println!("watchcmd dry-run");
    println!("  command = {command}");
    let events: Vec<String> = list.config.events.iter().map(|e| e.to_string()).collect();
    println!("  config.events = {events:?}");
    match list.config.wait_timeout_ms {
        Some(ms) => println!("  config.wait_timeout_ms = {ms}"),
        None => println!("  config.wait_timeout_ms = (none)"),
    }
    println!("  config.read_buffer_bytes = {}", list.config.read_buffer_bytes);
    println!();

    println!("files ({}):", list.paths().len());
    for path in list.paths() {
        let note = if path.is_file() { "" } else { "  (not a regular file)" };
        println!("  - {}{note}", path.display());
    }
}
