//! Process-wide `tracing` setup.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// JSON log of everything that passes the level filter.
pub const LOG_FILE_NAME: &str = "combined.log";
/// JSON log of error-level events only.
pub const ERROR_LOG_FILE_NAME: &str = "error.log";

/// Keeps the non-blocking file writers alive; dropping it flushes them.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _combined: WorkerGuard,
    _errors: WorkerGuard,
}

/// Install the global subscriber: console output, JSON lines in
/// `<log_dir>/combined.log`, and errors also in `<log_dir>/error.log`.
pub fn init_tracing(level: &str, log_dir: &Path) -> Result<LogGuards> {
    let (subscriber, guards) = build_subscriber(level, log_dir)?;
    subscriber
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guards)
}

fn build_subscriber(
    level: &str,
    log_dir: &Path,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuards)> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("invalid log level directive '{level}'"))?;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let (combined_writer, combined) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE_NAME));
    let (error_writer, errors) = tracing_appender::non_blocking(
        tracing_appender::rolling::never(log_dir, ERROR_LOG_FILE_NAME),
    );

    let combined_layer = fmt::layer()
        .json()
        .with_writer(combined_writer)
        .with_ansi(false);
    let error_layer = fmt::layer()
        .json()
        .with_writer(error_writer)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);
    let stdout_layer = fmt::layer().compact().with_writer(std::io::stdout);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(combined_layer)
        .with(error_layer);
    Ok((
        subscriber,
        LogGuards {
            _combined: combined,
            _errors: errors,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_copied_to_the_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let (subscriber, guards) = build_subscriber("info", &log_dir).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(number = "6281234567890", "message sent successfully");
            tracing::error!(error = "chat not found", "error sending message");
        });
        drop(guards);

        let combined = std::fs::read_to_string(log_dir.join(LOG_FILE_NAME)).unwrap();
        assert!(combined.contains("message sent successfully"));
        assert!(combined.contains("error sending message"));

        let errors = std::fs::read_to_string(log_dir.join(ERROR_LOG_FILE_NAME)).unwrap();
        assert!(errors.contains("error sending message"));
        assert!(!errors.contains("message sent successfully"));
        let first = errors.lines().next().unwrap();
        let entry: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(entry["level"], "ERROR");
    }

    #[test]
    fn invalid_level_directive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(build_subscriber("wadispatch=verbose", dir.path()).is_err());
    }
}
