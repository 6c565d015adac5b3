// ============================================================================
// src/util/logging.rs – tracing subscriber routed to a file
// ============================================================================
//
// stdout belongs to the wizard screen, so diagnostics never go to the
// terminal. No log file means no logging.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `info` → `debug` → `trace` as `-v` repeats.
pub fn level_for(base: &str, verbose: u8) -> String {
    match verbose {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. Returns false when the log file could not
/// be opened and logging stays off.
pub fn init(path: &Path, level: &str) -> bool {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
