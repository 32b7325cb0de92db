use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;
use super::logging::LoggingConfig;
use super::store::CredentialStoreConfig;

/// Environment variable naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "LMSPORTAL_CONFIG";
/// Prefix for environment overrides, e.g. `LMSPORTAL_BACKEND__BASE_URL`.
pub const ENV_PREFIX: &str = "LMSPORTAL_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: backend location, credential storage and logging.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub backend: BackendConfig,
    #[serde(default)]
    pub credentials: CredentialStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Build the figment used for loading: the YAML file first, then env overrides.
fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
}

/// Load a config from the given YAML file, with `LMSPORTAL_` env overrides applied.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<ConfigV1, figment::Error> {
    match figment_for(path.as_ref()).extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// `$LMSPORTAL_CONFIG`, falling back to "./config.yaml".
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string())
}

/// Load config from [`config_path`], exiting the process if it is unusable.
pub fn load_config() -> ConfigV1 {
    let path = config_path();
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration from '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to render configuration schema: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialBackend;

    const FULL_CONFIG: &str = r#"
version: "1.0.0"
backend:
  base_url: "http://localhost:8000"
  timeout_in_ms: 2500
credentials:
  persist: true
  type: file
  path: "/tmp/lmsportal/token"
logging:
  level: "debug"
  format: "json"
"#;

    fn parse(yaml: &str) -> ConfigV1 {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml))
            .extract()
            .expect("Failed to parse test config YAML");
        match config {
            Config::ConfigV1(cfg) => cfg,
        }
    }

    #[test]
    fn test_full_config_parses() {
        let cfg = parse(FULL_CONFIG);
        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.backend.timeout_in_ms, Some(2500));
        assert!(cfg.credentials.persist);
        match cfg.credentials.backend {
            Some(CredentialBackend::File(ref file)) => {
                assert_eq!(file.path, "/tmp/lmsportal/token")
            }
            None => panic!("expected a file backend"),
        }
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.service_name, "lmsportal");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = parse(
            r#"
version: "1.0.0"
backend:
  base_url: "http://backend"
"#,
        );
        assert_eq!(cfg.backend.timeout_in_ms, None);
        assert!(!cfg.credentials.persist);
        assert!(cfg.credentials.backend.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let result = Figment::new()
            .merge(Yaml::string(
                r#"
version: "0.9.0"
backend:
  base_url: "http://backend"
"#,
            ))
            .extract::<Config>();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join(format!("{}.yaml", uuid::Uuid::new_v4()));
        assert!(load_config_from(missing).is_err());
    }

    #[test]
    fn test_env_overrides_nest_on_double_underscore() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
version: "1.0.0"
backend:
  base_url: "http://from-file"
logging:
  level: "info"
  format: "console"
"#,
            )?;
            jail.set_env("LMSPORTAL_BACKEND__BASE_URL", "http://from-env:8000");
            jail.set_env("LMSPORTAL_BACKEND__TIMEOUT_IN_MS", "750");
            jail.set_env("LMSPORTAL_LOGGING__FORMAT", "json");

            let cfg = load_config_from("config.yaml")?;
            assert_eq!(cfg.backend.base_url, "http://from-env:8000");
            assert_eq!(cfg.backend.timeout_in_ms, Some(750));
            assert_eq!(cfg.logging.format, "json");
            assert_eq!(cfg.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_config_path_comes_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "elsewhere.yaml",
                r#"
version: "1.0.0"
backend:
  base_url: "http://elsewhere"
"#,
            )?;
            jail.set_env(CONFIG_PATH_ENV, "elsewhere.yaml");
            assert_eq!(config_path(), "elsewhere.yaml");

            // The path variable itself is not read as a config key.
            let cfg = load_config();
            assert_eq!(cfg.backend.base_url, "http://elsewhere");
            Ok(())
        });
    }
}
