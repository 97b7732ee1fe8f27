//! # Structured Logging Module
//!
//! Environment-aware structured logging for the ingestion daemon: a human
//! console layer plus a non-blocking JSON file layer for post-hoc analysis
//! of long-running poller sessions.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; only the first call installs the subscriber.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let log_dir = PathBuf::from("log");
        if !log_dir.exists() && fs::create_dir_all(&log_dir).is_err() {
            // Fall back to console-only logging below.
            eprintln!("eggi-ingest: could not create log directory, console logging only");
        }

        let pid = process::id();
        let log_filename = format!("{environment}.{pid}.log");

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(EnvFilter::new(log_level.clone())),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(log_level)),
            );

        // A global subscriber may already be installed by an embedding
        // application; that is not an error.
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized with file output"
        );

        // The writer guard must live for the process lifetime.
        std::mem::forget(guard);
    });
}

/// Get current environment from environment variables.
fn get_environment() -> String {
    std::env::var("EGGI_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment.
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_detection() {
        std::env::set_var("EGGI_ENV", "test_override");
        assert_eq!(get_environment(), "test_override");
        std::env::remove_var("EGGI_ENV");
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("anything-else"), "debug");
    }
}
