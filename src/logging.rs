//! File logging. The terminal belongs to the UI, so every event goes to
//! `ytdash.log` under the platform data directory instead.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::constants::constants;

/// Install the global subscriber. The returned guard flushes the writer on drop
/// and must live until the program exits. Returns `None` when there is no data
/// directory to log into.
pub fn init_logging() -> Result<Option<WorkerGuard>> {
  let Some(dirs) = ProjectDirs::from("", "", "ytdash") else {
    return Ok(None);
  };
  let directory = dirs.data_local_dir();
  std::fs::create_dir_all(directory).with_context(|| format!("Failed to create log directory {}", directory.display()))?;

  let appender = tracing_appender::rolling::never(directory, &constants().log_file);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(format!("{}=info,reqwest=warn,hyper=warn", env!("CARGO_CRATE_NAME"))));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false).with_line_number(true))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(Some(guard))
}
