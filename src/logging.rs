//! Logging setup.
//!
//! Filter precedence: `SHELF_LOG`, then `RUST_LOG`, then the level passed in.
//! The CLI logs to stderr. The TUI owns the terminal, so it logs to a file or
//! not at all.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppError;

/// Where log events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Discard,
}

/// Default level for a run (`--verbose` raises it to `debug`).
pub fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(level: &str, target: LogTarget<'_>) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_env("SHELF_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = matches!(target, LogTarget::Stderr)
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    let file_layer = match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open log file '{}': {e}", path.display())))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        _ => None,
    };

    // A subscriber may already be installed (tests, repeated runs).
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(default_level(true), "debug");
        assert_eq!(default_level(false), "warn");
    }

    #[test]
    fn file_target_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.log");
        init("info", LogTarget::File(&path)).unwrap();
        assert!(path.exists());
    }
}
