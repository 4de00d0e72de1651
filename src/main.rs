//! apidemo - retained background worker demo
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;

use apidemo_app::config::{init_config_dir, load_settings, Settings};
use apidemo_core::prelude::*;

/// apidemo - a progress worker that survives its screen being recreated
#[derive(Parser, Debug)]
#[command(name = "apidemo")]
#[command(about = "A progress worker that survives its screen being recreated", long_about = None)]
struct Args {
    /// Directory holding .apidemo/config.toml
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Override worker.limit
    #[arg(long)]
    limit: Option<u32>,

    /// Override worker.tick_ms
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Write a default .apidemo/config.toml and exit
    #[arg(long)]
    init: bool,
}

impl Args {
    fn apply_overrides(&self, settings: &mut Settings) -> Result<()> {
        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err(Error::config_invalid("--limit must be positive"));
            }
            settings.worker.limit = limit;
            if !settings.worker.limit_choices.contains(&limit) {
                settings.worker.limit_choices.push(limit);
            }
        }
        if let Some(tick_ms) = self.tick_ms {
            if tick_ms == 0 {
                return Err(Error::config_invalid("--tick-ms must be positive"));
            }
            settings.worker.tick_ms = tick_ms;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let base_path = args
        .path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        init_config_dir(&base_path)?;
        eprintln!(
            "Wrote {}",
            base_path.join(".apidemo").join("config.toml").display()
        );
        return Ok(());
    }

    color_eyre::install().map_err(|e| Error::setup(e.to_string()))?;
    apidemo_core::logging::init()?;

    let mut settings = load_settings(&base_path);
    args.apply_overrides(&mut settings)?;

    eprintln!(
        "apidemo: commands on stdin (restart, rotate, limit <n>, notify, stop-notify, status, finish, quit)"
    );
    eprintln!(
        "         logs in {}",
        apidemo_core::logging::get_current_log_file().display()
    );

    let result = apidemo::run_headless(&base_path, settings).await;
    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }
    result
}
