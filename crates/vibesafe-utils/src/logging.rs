//! Structured logging setup shared by the `vibesafe` binary and its tests.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a `tracing` subscriber reading filter directives from `VIBESAFE_LOG`
/// (falling back to `info`). Safe to call more than once; later calls are
/// no-ops once a global subscriber is set.
pub fn init() {
    let filter = EnvFilter::try_from_env("VIBESAFE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Install a JSON-formatted subscriber, used by `--json` CLI invocations so
/// log lines don't interleave with the JCS-canonical JSON the command emits
/// on stdout (logs go to stderr either way).
pub fn init_json() {
    let filter = EnvFilter::try_from_env("VIBESAFE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
