pub mod fake_channel;
pub mod records;
pub mod recording_runner;

use std::sync::Once;

use tracing_subscriber::fmt;
use watchcmd::logging::{LOG_ENV, build_filter};

static INIT: Once = Once::new();

/// Install a per-test tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `-- --nocapture`). The filter comes from `WATCHCMD_LOG`, then
/// `RUST_LOG`, then `info`:
///
/// `WATCHCMD_LOG=watchcmd::engine=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok();

        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(build_filter(None, env.as_deref()))
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
