//! Gauntlet CLI configuration

use gauntlet_harness::HarnessConfig;
use gauntlet_probe::ProbeConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration of the `gauntlet` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Parameter derivation and phase execution
    #[serde(default)]
    pub harness: HarnessConfig,

    /// Defensive-check counters
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from defaults, an optional file, then
    /// `GAUNTLET_*` environment variables (`GAUNTLET_HARNESS__MAX_USERS=4`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with GAUNTLET_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("GAUNTLET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.harness.max_users, 11);
        assert!(config.harness.validate().is_ok());
    }

    #[test]
    fn test_load_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.harness.functional_items, 20);
        assert_eq!(config.harness.performance_items, 50);
        assert!(config.harness.seed.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("gauntlet-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gauntlet.toml");
        std::fs::write(
            &path,
            "[harness]\nmax_users = 4\nseed = 9\n\n[logging]\njson = true\n",
        )
        .unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        assert_eq!(config.harness.max_users, 4);
        assert_eq!(config.harness.min_users, 2);
        assert_eq!(config.harness.seed, Some(9));
        assert!(config.logging.json);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = AppConfig::load(Some("/nonexistent/gauntlet")).unwrap();
        assert_eq!(config.logging.level, "info");
    }
}
