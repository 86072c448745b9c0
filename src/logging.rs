//! Tracing configuration and log routing.
//!
//! The service logs to stdout using a compact formatter. When a log file is configured
//! (`DAILY_LIGHT_LOG_FILE`), logs are also appended to that path through a non-blocking writer.
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::RunMode;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// - Respects `RUST_LOG` for filtering; otherwise uses the run mode default.
/// - Uses a global guard to keep the non‑blocking writer alive for the process lifetime.
pub fn init_tracing(run_mode: RunMode, log_file: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(run_mode.default_log_filter()));
    let stdout_layer = fmt::layer()
        .with_target(run_mode.is_development())
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = log_file.and_then(configure_file_writer) {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

fn configure_file_writer(path: &Path) -> Option<NonBlocking> {
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}
