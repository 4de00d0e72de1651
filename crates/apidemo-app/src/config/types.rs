//! Configuration types for apidemo
//!
//! Defines:
//! - `Settings` - Top-level settings file
//! - `SessionSettings`, `WorkerSettings`, `NotifierSettings` - Sections

use std::time::Duration;

use apidemo_core::SessionKey;
use serde::{Deserialize, Serialize};

use crate::worker::{WorkerConfig, WorkerTiming};

/// Application settings (.apidemo/config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub worker: WorkerSettings,

    #[serde(default)]
    pub notifier: NotifierSettings,
}

impl Settings {
    /// Worker configuration derived from the `[worker]` section
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            limit: self.worker.limit,
            timing: WorkerTiming {
                tick: Duration::from_millis(self.worker.tick_ms),
                wait_timeout: Duration::from_millis(self.worker.wait_timeout_ms),
            },
        }
    }

    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.session.key.clone())
    }
}

/// Session settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Registry key the progress worker is retained under
    #[serde(default = "default_session_key")]
    pub key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            key: default_session_key(),
        }
    }
}

/// Retained worker settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerSettings {
    /// Position at which the worker parks
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Simulated work between increments
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Upper bound on a single park before the loop re-checks its state
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Values offered by the limit spinner
    #[serde(default = "default_limit_choices")]
    pub limit_choices: Vec<u32>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            tick_ms: default_tick_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            limit_choices: default_limit_choices(),
        }
    }
}

/// Notifying service settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierSettings {
    /// How many times the full mood cycle is posted
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Delay between two notifications
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl NotifierSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_session_key() -> String {
    "retained-progress".to_string()
}

fn default_limit() -> u32 {
    500
}

fn default_tick_ms() -> u64 {
    50
}

fn default_wait_timeout_ms() -> u64 {
    250
}

fn default_limit_choices() -> Vec<u32> {
    vec![100, 250, 500, 1000]
}

fn default_rounds() -> u32 {
    4
}

fn default_interval_ms() -> u64 {
    5000
}
