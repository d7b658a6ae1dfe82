//! Configuration Loader
//!
//! Environment-aware loading: an optional base TOML file, an optional
//! per-environment overlay next to it, then `GANGWAY_`-prefixed environment
//! variables on top. The merged result is validated before anything sees it.

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ConfigResult;
use super::GangwayConfig;

const DEFAULT_CONFIG_FILE: &str = "config/gangway.toml";
const ENV_PREFIX: &str = "GANGWAY";

/// Loaded configuration plus the environment it was loaded for
pub struct ConfigManager {
    config: GangwayConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_file(None)
    }

    /// Load configuration from a specific base file
    pub fn load_from_file(config_path: Option<&Path>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_file_with_env(config_path, &environment)
    }

    /// Load configuration from a specific base file with an explicit
    /// environment. Useful for testing without touching global environment
    /// variables.
    pub fn load_from_file_with_env(
        config_path: Option<&Path>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let base_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let overlay_path = Self::overlay_path(&base_path, environment);

        debug!(
            environment = %environment,
            base = %base_path.display(),
            overlay = %overlay_path.display(),
            "Loading configuration"
        );

        let merged = Config::builder()
            .add_source(File::from(base_path.clone()).required(false))
            .add_source(File::from(overlay_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: GangwayConfig = merged.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            placement_rules = config.placement.rules.len(),
            max_attempts = config.retry.max_attempts,
            sync_delay_secs = config.scheduling.sync_delay_secs,
            tracking_enabled = config.tracking.enabled,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &GangwayConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Detect current environment: GANGWAY_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("GANGWAY_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// Per-environment overlay next to the base file:
    /// `config/gangway.toml` -> `config/gangway.production.toml`
    fn overlay_path(base: &Path, environment: &str) -> PathBuf {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("gangway");
        let extension = base.extension().and_then(|s| s.to_str()).unwrap_or("toml");
        base.with_file_name(format!("{stem}.{environment}.{extension}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let manager =
            ConfigManager::load_from_file_with_env(Some(Path::new("/nonexistent/gangway.toml")), "test")
                .unwrap();
        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().retry.max_attempts, 3);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gangway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[retry]
max_attempts = 5
resume_backoff_secs = 120

[scheduling]
sync_delay_secs = 60

[tracking]
enabled = true

[placement]
default = {{ domain = "corp.example", ou = "OU=Staff,DC=corp" }}

[[placement.rules]]
conditions = {{ departments = ["engineering"] }}
domain = "eng.corp.example"
ou = "OU=Engineering,DC=corp"
"#
        )
        .unwrap();

        let manager = ConfigManager::load_from_file_with_env(Some(&path), "test").unwrap();
        let config = manager.config();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.resume_backoff_secs, 120);
        assert_eq!(config.scheduling.sync_delay_secs, 60);
        assert!(config.tracking.enabled);
        assert_eq!(config.placement.rules.len(), 1);
    }

    #[test]
    fn test_environment_overlay_wins_over_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("gangway.toml");
        std::fs::write(&base, "[retry]\nmax_attempts = 5\n").unwrap();
        let overlay = dir.path().join("gangway.staging.toml");
        std::fs::write(&overlay, "[retry]\nmax_attempts = 7\n").unwrap();

        let manager = ConfigManager::load_from_file_with_env(Some(&base), "staging").unwrap();
        assert_eq!(manager.config().retry.max_attempts, 7);
    }

    #[test]
    fn test_invalid_values_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gangway.toml");
        std::fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

        assert!(ConfigManager::load_from_file_with_env(Some(&path), "test").is_err());
    }

    #[test]
    fn test_overlay_path_shape() {
        let overlay =
            ConfigManager::overlay_path(Path::new("config/gangway.toml"), "production");
        assert_eq!(overlay, PathBuf::from("config/gangway.production.toml"));
    }
}
