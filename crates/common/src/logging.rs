// m13 - REST facade for live debugging sessions
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging configuration for m13 components
//!
//! Provides centralized logging setup with:
//! - Colorful console output with thread names (the HTTP listener and the
//!   engine worker run on their own named threads)
//! - Optional file logging to a temporary directory with daily rotation
//! - Environment variable support (`RUST_LOG`)

use eyre::{eyre, Result};
use std::{env, fs, path::PathBuf, sync::Once};
use tracing::Level;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Directory under the system temp folder that holds per-component log files
const LOG_ROOT: &str = "m13-logs";

/// Initialize logging for an m13 component
///
/// This function sets up:
/// - Structured console logging with timestamps and thread names
/// - File logging to `$TMP/m13-logs/<component>` with daily rotation
///   (when `enable_file_logging` is set)
/// - `RUST_LOG` support, defaulting to `default_level`
///
/// # Arguments
/// * `component_name` - Name of the component (e.g., "m13")
/// * `default_level` - Level used when `RUST_LOG` is unset
/// * `enable_file_logging` - Whether to also write logs to disk
///
/// # Examples
/// ```rust,ignore
/// m13_common::logging::init_logging("m13", Level::INFO, true)?;
/// tracing::info!("Application started");
/// ```
pub fn init_logging(
    component_name: &str,
    default_level: Level,
    enable_file_logging: bool,
) -> Result<()> {
    let env_filter = default_filter(default_level.as_str())?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true);

    if enable_file_logging {
        let log_dir = create_log_directory(component_name)?;

        let file_appender = rolling::daily(&log_dir, format!("{component_name}.log"));
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        // The writer must outlive every thread that logs, including the
        // listener thread, so the guard is leaked for the process lifetime.
        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(LocalTime::rfc_3339())
            .with_ansi(false)
            .with_writer(non_blocking_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer.with_filter(filter_for_console()?))
            .with(file_layer)
            .try_init()
            .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::info!(
            component = component_name,
            log_dir = %log_dir.display(),
            "Logging initialized with console and file output"
        );
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer.with_filter(filter_for_console()?))
            .try_init()
            .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::info!(component = component_name, "Logging initialized with console output only");
    }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing::debug!(component = component_name, rust_log = %rust_log, "Environment information");

    Ok(())
}

/// Build an [`EnvFilter`] from `RUST_LOG`, falling back to `level`
fn default_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| eyre!("Failed to create environment filter: {e}"))
}

/// Create log directory in system temp folder
fn create_log_directory(component_name: &str) -> Result<PathBuf> {
    let log_dir = env::temp_dir().join(LOG_ROOT).join(component_name);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Filter for console output - quiet the HTTP stack
fn filter_for_console() -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["tower_http=warn", "hyper=warn", "reqwest=warn"] {
        filter = filter.add_directive(
            directive.parse().map_err(|e| eyre!("Invalid log directive {directive}: {e}"))?,
        );
    }
    Ok(filter)
}

/// Initialize simple logging (console only, compact formatting)
///
/// # Arguments
/// * `level` - The default log level to use
pub fn init_simple_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(level.as_str())?)
        .with_target(false)
        .with_test_writer()
        .compact()
        .try_init()
        .map_err(|e| eyre!("Failed to initialize simple logging: {e}"))
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Safe logging initialization for tests - can be called multiple times
///
/// Uses [`Once`] so that only the first call installs a subscriber; later
/// calls (from other tests in the same process) are no-ops.
///
/// ```rust,ignore
/// #[test]
/// fn my_test() {
///     m13_common::logging::ensure_test_logging(None);
///     tracing::info!("Running test");
/// }
/// ```
pub fn ensure_test_logging(default_level: Option<Level>) {
    TEST_LOGGING_INIT.call_once(|| {
        // A subscriber installed elsewhere is fine for tests.
        let _ = init_simple_logging(default_level.unwrap_or(Level::INFO));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, info, warn};

    #[test]
    fn test_logging_functions_work() {
        ensure_test_logging(None);

        info!("Test info message");
        warn!("Test warning message");
        debug!("Test debug message");
    }

    #[test]
    fn test_log_directory_creation() {
        let log_dir = create_log_directory("test-component").unwrap();

        assert!(log_dir.exists());
        assert!(log_dir.to_string_lossy().contains(LOG_ROOT));
        assert!(log_dir.to_string_lossy().contains("test-component"));
    }

    #[test]
    fn test_console_filter_builds() {
        let filter = filter_for_console().unwrap();
        assert!(filter.to_string().contains("hyper=warn"));
    }

    #[test]
    fn test_repeated_initialization_does_not_panic() {
        ensure_test_logging(None);

        // A subscriber is already installed, so both attempts fail gracefully.
        assert!(init_logging("test-repeat-1", Level::INFO, false).is_err());
        assert!(init_logging("test-repeat-2", Level::DEBUG, false).is_err());

        info!("Logging still works after repeated initialization attempts");
    }
}
