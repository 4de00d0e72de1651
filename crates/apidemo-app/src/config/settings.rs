//! Settings parser for .apidemo/config.toml

use super::types::Settings;
use apidemo_core::prelude::*;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.toml";
const APIDEMO_DIR: &str = ".apidemo";

const DEFAULT_CONFIG: &str = r#"# apidemo configuration

[session]
# Registry key the progress worker is retained under
key = "retained-progress"

[worker]
# Position at which the worker parks until restarted
limit = 500
# Simulated work between two increments (milliseconds)
tick_ms = 50
# Longest single park before the loop re-checks its state (milliseconds)
wait_timeout_ms = 250
# Values offered by the limit spinner
limit_choices = [100, 250, 500, 1000]

[notifier]
# Number of happy/neutral/sad cycles before the service stops itself
rounds = 4
# Delay between two notifications (milliseconds)
interval_ms = 5000
"#;

/// Load settings from .apidemo/config.toml
///
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = project_path.join(APIDEMO_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<Settings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                sanitize(settings)
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Replace values the worker cannot run with
fn sanitize(mut settings: Settings) -> Settings {
    if settings.worker.wait_timeout_ms == 0 {
        warn!("worker.wait_timeout_ms must be positive, using 250");
        settings.worker.wait_timeout_ms = 250;
    }
    if settings.worker.tick_ms == 0 {
        warn!("worker.tick_ms must be positive, using 50");
        settings.worker.tick_ms = 50;
    }
    if settings.worker.limit_choices.is_empty() {
        settings.worker.limit_choices = vec![settings.worker.limit];
    }
    if settings.session.key.trim().is_empty() {
        warn!("session.key is empty, using the default key");
        settings.session = Default::default();
    }
    settings
}

/// Create default config file in .apidemo/ directory
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let apidemo_dir = project_path.join(APIDEMO_DIR);

    if !apidemo_dir.exists() {
        std::fs::create_dir_all(&apidemo_dir)
            .map_err(|e| Error::config(format!("Failed to create .apidemo dir: {}", e)))?;
    }

    let config_path = apidemo_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(temp.path());

        assert_eq!(settings.worker.limit, 500);
        assert_eq!(settings.worker.tick_ms, 50);
        assert_eq!(settings.session.key, "retained-progress");
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".apidemo");
        std::fs::create_dir_all(&dir).unwrap();

        let config = r#"
[session]
key = "rotation-demo"

[worker]
limit = 20
tick_ms = 10

[notifier]
rounds = 1
"#;
        std::fs::write(dir.join("config.toml"), config).unwrap();

        let settings = load_settings(temp.path());

        assert_eq!(settings.session.key, "rotation-demo");
        assert_eq!(settings.worker.limit, 20);
        assert_eq!(settings.worker.tick_ms, 10);
        assert_eq!(settings.worker.wait_timeout_ms, 250);
        assert_eq!(settings.notifier.rounds, 1);
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".apidemo");
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(dir.join("config.toml"), "not valid toml {{{{").unwrap();

        let settings = load_settings(temp.path());
        assert_eq!(settings.worker.limit, 500);
    }

    #[test]
    fn test_load_settings_sanitizes_zero_durations() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".apidemo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[worker]\ntick_ms = 0\nwait_timeout_ms = 0\nlimit_choices = []\n",
        )
        .unwrap();

        let settings = load_settings(temp.path());
        assert_eq!(settings.worker.tick_ms, 50);
        assert_eq!(settings.worker.wait_timeout_ms, 250);
        assert_eq!(settings.worker.limit_choices, vec![500]);
    }

    #[test]
    fn test_init_config_dir() {
        let temp = tempdir().unwrap();

        init_config_dir(temp.path()).unwrap();

        assert!(temp.path().join(".apidemo/config.toml").exists());

        // The written file round-trips to the defaults
        let settings = load_settings(temp.path());
        assert_eq!(settings.worker.limit, 500);
        assert_eq!(settings.notifier.interval_ms, 5000);
    }

    #[test]
    fn test_init_config_dir_keeps_existing_file() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".apidemo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[worker]\nlimit = 7\n").unwrap();

        init_config_dir(temp.path()).unwrap();

        assert_eq!(load_settings(temp.path()).worker.limit, 7);
    }
}
