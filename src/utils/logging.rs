//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the audit tracker.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::{AuditError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file appender when dropped and must be
/// kept alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, "s5_audit.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| AuditError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log problem lifecycle events
pub fn log_problem_event(problem_id: &str, event: &str, actor_id: &str, details: Option<&str>) {
    info!(
        problem_id = problem_id,
        event = event,
        actor_id = actor_id,
        details = details,
        "Problem event"
    );
}

/// Log group events
pub fn log_group_event(group_id: &str, event: &str, user_id: Option<&str>, details: Option<&str>) {
    info!(
        group_id = group_id,
        event = event,
        user_id = user_id,
        details = details,
        "Group event occurred"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}

/// Log the outcome of a photo retention sweep
pub fn log_photo_sweep(deleted: usize, failed: usize, retention_days: u64) {
    if failed > 0 {
        warn!(
            deleted = deleted,
            failed = failed,
            retention_days = retention_days,
            "Photo sweep finished with failures"
        );
    } else {
        info!(deleted = deleted, retention_days = retention_days, "Photo sweep finished");
    }
}
