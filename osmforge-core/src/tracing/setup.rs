//! Logging bootstrap for pipeline hosts.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{LOG_ENV_VAR, LOG_FALLBACK_DIRECTIVE};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber for a pipeline run.
///
/// Per-subsystem levels come from `OSMFORGE_LOG`
/// (e.g. `OSMFORGE_LOG=osmforge_analysis=debug,osmforge_cache=warn`);
/// anything unusable falls back to `osmforge=info`. With `verbose` set,
/// events additionally carry their source file and line, which is what
/// you want when chasing a misbehaving step.
///
/// Only the first call installs anything; later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(LOG_FALLBACK_DIRECTIVE));
    let events = fmt::layer()
        .with_target(true)
        .with_file(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry().with(events).with(filter).init();
}
