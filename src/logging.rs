//! tracing subscriber setup.
//!
//! The interface owns the terminal, so interactive sessions log to a file.
//! Report mode logs to stderr. `POTATO_LOG` takes an `EnvFilter` directive
//! and overrides the level picked from `--debug`.

use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "POTATO_LOG";

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if debug { "potato=debug" } else { "potato=info" })
    })
}

/// Append log lines to `path`, creating parent directories as needed.
pub fn init_file_logging(path: &Path, debug: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// Warnings (or everything with `--debug`) to stderr.
pub fn init_stderr_logging(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if debug { "potato=debug" } else { "potato=warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("potato.log");
        init_file_logging(&path, false).unwrap();
        assert!(path.exists());
    }
}
