use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    /// Upper bound on a single job-status request
    #[serde(default = "default_status_timeout")]
    pub status_timeout: HumanDuration,
    /// Pause inserted before every status fetch
    #[serde(default = "default_request_delay")]
    pub request_delay: HumanDuration,
    /// Session cookie (loaded from environment, not from config file)
    #[serde(skip)]
    pub cookie: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            connect_timeout: default_connect_timeout(),
            status_timeout: default_status_timeout(),
            request_delay: default_request_delay(),
            cookie: None,
        }
    }
}

fn default_base_url() -> String {
    "https://www.midjourney.com/api/app".to_string()
}

fn default_user_agent() -> String {
    "artvault/0.1.0".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_status_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_delay() -> HumanDuration {
    HumanDuration::from_millis(100)
}

/// Archive output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Directory sealed archives are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Leading segment of every archive file name
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            filename_prefix: default_filename_prefix(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("archives")
}

fn default_filename_prefix() -> String {
    "artvault".to_string()
}
