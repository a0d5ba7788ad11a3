//! Debug logging support
//!
//! When debug mode is enabled via the --debug flag, operations are logged
//! to a file. Logs are written to /var/log/refmig.log if writable,
//! otherwise ~/.refmig/refmig.log. The REFMIG_LOG environment variable
//! overrides the filter (tracing EnvFilter syntax).

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

const LOG_FILE_NAME: &str = "refmig.log";

/// Initialize the debug logging system
///
/// Returns the path to the log file, or None if logging is not enabled.
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<PathBuf>> {
    if !debug_enabled {
        return Ok(None);
    }

    let log_dir = log_directory()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let filter =
        EnvFilter::try_from_env("REFMIG_LOG").unwrap_or_else(|_| EnvFilter::new("refmig=debug"));

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(Some(log_dir.join(LOG_FILE_NAME)))
}

/// Tries /var/log first, falls back to ~/.refmig
fn log_directory() -> Result<PathBuf> {
    if can_write_to_var_log() {
        return Ok(PathBuf::from("/var/log"));
    }

    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".refmig"))
}

/// Check if /var/log is writable
fn can_write_to_var_log() -> bool {
    let test_file = "/var/log/.refmig_test_write";
    match fs::write(test_file, b"") {
        Ok(_) => {
            let _ = fs::remove_file(test_file);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_debug_logging_disabled() {
        let result = init_debug_logging(false);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), None, "Should return None when debug is disabled");
    }

    #[test]
    fn test_log_directory_resolves() {
        let dir = log_directory().unwrap();
        let is_var_log = dir == PathBuf::from("/var/log");
        assert!(
            is_var_log || dir.ends_with(".refmig"),
            "Log directory should be /var/log or ~/.refmig, got: {}",
            dir.display()
        );
    }
}
