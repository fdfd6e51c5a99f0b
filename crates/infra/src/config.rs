//! Configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. Defaults in code
//! 2. `config/<environment>.toml` (optional)
//! 3. Environment variables with the `DAIRY` prefix and `__` separator
//!    (e.g. `DAIRY__LOGGING__LEVEL=debug`)
//!
//! `DAIRY__ENVIRONMENT` both names the file to load and sets `environment`.

use config::{ConfigError, Environment, File, Map};
use serde::Deserialize;

use dairyledger_observability::LoggingConfig;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DairyConfig {
    /// Current environment (development, production, test).
    pub environment: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Unit label used when a product is saved without one.
    pub default_unit: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_unit: "liters".to_string(),
        }
    }
}

impl Default for DairyConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            logging: LoggingConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

const ENVIRONMENT_VAR: &str = "DAIRY__ENVIRONMENT";
const DEFAULT_ENVIRONMENT: &str = "development";

impl DairyConfig {
    /// Load configuration from `.env`, files and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_from_vars(None, "config")
    }

    /// Load configuration for an explicit environment from `dir`.
    pub fn load_for(environment: &str, dir: &str) -> Result<Self, ConfigError> {
        Self::build(environment, dir, None)
    }

    /// `vars` stands in for the process environment when given.
    fn load_from_vars(vars: Option<Map<String, String>>, dir: &str) -> Result<Self, ConfigError> {
        let environment = match &vars {
            Some(vars) => vars.get(ENVIRONMENT_VAR).cloned(),
            None => std::env::var(ENVIRONMENT_VAR).ok(),
        }
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        Self::build(&environment, dir, vars)
    }

    fn build(
        environment: &str,
        dir: &str,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let defaults = LoggingConfig::default();

        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("logging.level", defaults.level)?
            .set_default("logging.json", defaults.json)?
            .set_default("catalog.default_unit", CatalogConfig::default().default_unit)?
            .add_source(File::with_name(&format!("{dir}/{environment}")).required(false))
            .add_source(
                Environment::with_prefix("DAIRY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config_files() {
        let config = DairyConfig::load_for("unit-test", "does-not-exist").unwrap();

        assert_eq!(config.environment, "unit-test");
        assert_eq!(config.catalog.default_unit, "liters");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("dairyledger-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("staging.toml"),
            "[logging]\nlevel = \"debug\"\njson = false\n\n[catalog]\ndefault_unit = \"kg\"\n",
        )
        .unwrap();

        let config = DairyConfig::load_for("staging", dir.to_str().unwrap()).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
        assert_eq!(config.catalog.default_unit, "kg");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn environment_variable_selects_file_and_sets_environment() {
        let dir = std::env::temp_dir().join(format!("dairyledger-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("production.toml"), "[catalog]\ndefault_unit = \"kg\"\n").unwrap();

        let vars = Map::from_iter([
            ("DAIRY__ENVIRONMENT".to_string(), "production".to_string()),
            ("DAIRY__LOGGING__LEVEL".to_string(), "warn".to_string()),
        ]);
        let config = DairyConfig::load_from_vars(Some(vars), dir.to_str().unwrap()).unwrap();

        assert_eq!(config.environment, "production");
        assert_eq!(config.catalog.default_unit, "kg");
        assert_eq!(config.logging.level, "warn");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_environment_variable_falls_back_to_development() {
        let config =
            DairyConfig::load_from_vars(Some(Map::new()), "does-not-exist").unwrap();
        assert_eq!(config.environment, "development");
    }
}
