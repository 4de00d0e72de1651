//! Configuration file parsing for apidemo
//!
//! Supports:
//! - `.apidemo/config.toml` - Session, worker, and notifier settings

pub mod settings;
pub mod types;

pub use settings::{init_config_dir, load_settings};
pub use types::*;
