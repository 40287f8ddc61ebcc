use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "ARTVAULT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/artvault.toml";
const ENV_PREFIX: &str = "ARTVAULT";
const ENV_SEPARATOR: &str = "__";
const COOKIE_ENV_VAR: &str = "ARTVAULT_COOKIE";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    // Load secrets from environment variables
    load_secrets(&mut config);

    Ok(config)
}

/// Load secrets from environment variables into config
/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(cookie) = env::var(COOKIE_ENV_VAR) {
        config.api.cookie = Some(cookie);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    // Start with defaults (handled by struct Default implementations)
    // Add TOML file if it exists (optional)
    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // Add environment variable overrides
    // ARTVAULT__API__BASE_URL -> api.base_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.api.base_url, "https://www.midjourney.com/api/app");
        assert_eq!(config.archive.filename_prefix, "artvault");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[api]
base_url = "http://127.0.0.1:8080/api/app"
status_timeout = "5s"
request_delay = "10ms"

[archive]
output_dir = "out"
filename_prefix = "vault"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080/api/app");
        assert_eq!(config.api.status_timeout.as_duration(), Duration::from_secs(5));
        assert_eq!(
            config.api.request_delay.as_duration(),
            Duration::from_millis(10)
        );
        assert_eq!(config.archive.output_dir, PathBuf::from("out"));
        assert_eq!(config.archive.filename_prefix, "vault");
    }

    // Note: env override tests omitted due to unsafe env::set_var usage

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[archive]
filename_prefix = "vault"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.api.user_agent, "artvault/0.1.0");
        assert_eq!(config.archive.output_dir, PathBuf::from("archives"));
        assert_eq!(config.archive.filename_prefix, "vault");
    }
}
