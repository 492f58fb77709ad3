//! Log setup for the CLI: a daily rolling file under the data directory.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "GYMDESK_LOG";

const DEFAULT_FILTER: &str = "info";

pub fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("gymdesk").join("logs"))
}

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir()?;
  std::fs::create_dir_all(&dir).map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::daily(&dir, "gymdesk.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = std::env::var(LOG_ENV)
    .ok()
    .and_then(|directive| EnvFilter::try_new(directive).ok())
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}
