// src/logging.rs

//! Logging setup for `watchcmd` using `tracing` + `tracing-subscriber`.
//!
//! Filter resolution:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WATCHCMD_LOG`: a bare level name (`error`, `warn`/`warning`, `info`,
//!    `debug`, `trace`, any case), otherwise `EnvFilter` directives such as
//!    `info,watchcmd::watch=trace`
//! 3. default to `info`
//!
//! Logs go to STDERR; stdout belongs to the dispatched command.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable read when no `--log-level` is given.
pub const LOG_ENV: &str = "WATCHCMD_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

/// Build the filter from the CLI level and the raw `WATCHCMD_LOG` value.
///
/// Unparseable directives fall back to `info` instead of failing startup.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        let level = LevelFilter::from(level_from_log_level(lvl));
        return EnvFilter::new(level.to_string());
    }

    let Some(raw) = env.map(str::trim).filter(|s| !s.is_empty()) else {
        return EnvFilter::new(LevelFilter::INFO.to_string());
    };

    // A bare word would otherwise parse as a target directive.
    if let Some(level) = parse_level_str(raw) {
        return EnvFilter::new(LevelFilter::from(level).to_string());
    }

    EnvFilter::try_new(raw).unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string()))
}

pub fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
