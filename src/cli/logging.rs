//! Logging initialization

use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize logging: `info` to stderr, plus a full debug log file when
/// `debug` is set.
///
/// Returns the log file path if debug logging is enabled
pub fn init_logging(debug: bool) -> Option<PathBuf> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let debug_log = if debug { open_debug_log() } else { None };
    let (file_layer, path) = match debug_log {
        Some((file, path)) => {
            let layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false) // No ANSI codes in log file
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    path
}

/// Create a persisted temp file for the debug log
fn open_debug_log() -> Option<(std::fs::File, PathBuf)> {
    let path = tempfile::Builder::new()
        .prefix("l2backup-")
        .suffix(".log")
        .tempfile()
        .ok()
        .and_then(|f| f.keep().ok())
        .map(|(_, path)| path)
        .unwrap_or_else(|| {
            std::env::temp_dir().join(format!("l2backup-{}.log", std::process::id()))
        });

    match std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&path)
    {
        Ok(file) => Some((file, path)),
        Err(e) => {
            eprintln!("Could not open debug log {}: {}", path.display(), e);
            None
        }
    }
}
