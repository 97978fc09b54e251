use std::fs::OpenOptions;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

pub const LOG_ENV: &str = "VIBECHECK_LOG";

/// Routes tracing output to the log file. The terminal belongs to the UI, so
/// nothing is written there; without a file logging stays off.
///
/// Writes go through a background worker. Keep the returned guard alive
/// until exit so buffered lines are flushed.
pub fn init(cfg: &LogConfig) -> Result<Option<WorkerGuard>> {
    let Some(path) = cfg.file.as_ref() else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("logging: create directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("logging: open {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = filter(cfg);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .try_init();
    if installed.is_err() {
        // Already initialised, e.g. a second run in the same process.
        return Ok(None);
    }
    tracing::info!(version = crate::VERSION, path = %path.display(), "logging started");
    Ok(Some(guard))
}

fn filter(cfg: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn disabled_without_file() {
        let cfg = LogConfig {
            level: "debug".into(),
            file: None,
        };
        assert!(init(&cfg).unwrap().is_none());
    }

    #[test]
    fn invalid_level_falls_back() {
        let cfg = LogConfig {
            level: "not a level [".into(),
            file: None,
        };
        let _ = filter(&cfg);
    }

    #[test]
    fn creates_log_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("vibecheck.log");
        let cfg = LogConfig {
            level: "info".into(),
            file: Some(path.clone()),
        };
        let guard = init(&cfg).unwrap();
        assert!(path.exists());
        drop(guard);
    }
}
