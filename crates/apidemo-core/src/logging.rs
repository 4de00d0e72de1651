//! File logging for the headless host
//!
//! stdout carries the NDJSON event stream, so every diagnostic goes to a daily
//! rolling file. The directory defaults to the platform data dir and can be
//! moved with `APIDEMO_LOG_DIR`; verbosity follows `APIDEMO_LOG`.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

const LOG_ENV_VAR: &str = "APIDEMO_LOG";
const LOG_DIR_ENV_VAR: &str = "APIDEMO_LOG_DIR";
const LOG_FILE_NAME: &str = "apidemo.log";

/// Worker and host chatter at info, everything else at warn
const DEFAULT_FILTER: &str = "apidemo=info,apidemo_app=info,warn";

/// Install the global subscriber.
///
/// Fails if the log directory cannot be created or a subscriber is already
/// installed.
///
/// ```bash
/// APIDEMO_LOG=apidemo_app::worker=trace apidemo
/// APIDEMO_LOG_DIR=/tmp/apidemo-logs apidemo
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);
    let filter = build_filter(std::env::var(LOG_ENV_VAR).ok().as_deref());

    // Thread ids tell the worker tasks apart from the stdin reader thread
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_timer(fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::setup(format!("logging already initialized: {}", e)))?;

    tracing::info!("apidemo logging to {}", log_dir.display());
    Ok(())
}

/// Filter from a directive string, falling back to the default when the
/// string is absent or does not parse
fn build_filter(directives: Option<&str>) -> EnvFilter {
    match directives.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(e)) => {
            eprintln!("Ignoring invalid {}: {}", LOG_ENV_VAR, e);
            EnvFilter::new(DEFAULT_FILTER)
        }
        None => EnvFilter::new(DEFAULT_FILTER),
    }
}

fn log_directory() -> PathBuf {
    resolve_log_directory(std::env::var_os(LOG_DIR_ENV_VAR).map(PathBuf::from))
}

fn resolve_log_directory(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.filter(|dir| !dir.as_os_str().is_empty()).unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("apidemo")
            .join("logs")
    })
}

/// Path of the file today's log lines go to
pub fn get_current_log_file() -> PathBuf {
    log_directory().join(LOG_FILE_NAME)
}
