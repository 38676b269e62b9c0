//! Logging setup for the cleanroom binary.
//!
//! Logs go to the console and to a daily-rotating file in the platform data
//! directory. The library itself only emits `tracing` events; installing a
//! subscriber is left to the binary (or to an embedding service).
//!
//! ```no_run
//! cleanroom::logging::init().expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/cleanroom/logs`
/// - macOS: `~/Library/Application Support/cleanroom/logs`
/// - Linux: `~/.local/share/cleanroom/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("cleanroom").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes console and file logging.
///
/// The console filter defaults to `info` and can be overridden with
/// `RUST_LOG`. The file layer always records this crate at `debug`, never
/// writes ANSI colour codes and keeps 10 daily files.
///
/// # Errors
///
/// Returns error if the log directory or the file appender cannot be created.
pub fn init() -> Result<()> {
    let log_dir = get_log_dir()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("cleanroom")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(env_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new("info,cleanroom=debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}
