//! Configuration management for artvault
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use artvault::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Archiving against: {}", config.api.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ARTVAULT__<section>__<key>`
//!
//! Examples:
//! - `ARTVAULT__API__BASE_URL=https://staging.example.com/api/app`
//! - `ARTVAULT__API__REQUEST_DELAY=250ms`
//! - `ARTVAULT__ARCHIVE__OUTPUT_DIR=/var/artvault`
//!
//! The session cookie is a secret and only ever read from `ARTVAULT_COOKIE`
//! (or a `.env` file), never from TOML.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/artvault.toml`.
//! This can be overridden using the `ARTVAULT_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::HumanDuration;
pub use models::{ApiConfig, ArchiveConfig, Config};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`ARTVAULT__*`, plus `ARTVAULT_COOKIE`)
    /// 2. TOML file (default: `config/artvault.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (bad base URL, unsafe archive prefix, zero timeouts).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
