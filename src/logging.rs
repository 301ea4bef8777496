//! Diagnostics go to a log file: the terminal belongs to the UI.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "hymnal.log";
/// Environment variable holding the log filter, e.g. `HYMNAL_LOG=debug`.
const LOG_ENV: &str = "HYMNAL_LOG";

/// Install the global subscriber writing to `<data_dir>/hymnal.log`.
pub fn init(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir).context("failed to create log directory")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))
        .context("failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("failed to install log subscriber")
}
