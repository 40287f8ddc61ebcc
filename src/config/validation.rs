use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Archive filename prefix must not be empty")]
    EmptyFilenamePrefix,

    #[error("Archive filename prefix '{prefix}' contains characters outside [A-Za-z0-9_-]")]
    UnsafeFilenamePrefix { prefix: String },

    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_base_url(config)?;
    validate_filename_prefix(config)?;
    validate_timeouts(config)?;
    Ok(())
}

/// Ensure the base URL is an http(s) URL with a host part
fn validate_base_url(config: &Config) -> Result<(), ValidationError> {
    let url = &config.api.base_url;

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| ValidationError::InvalidBaseUrl {
            url: url.clone(),
            reason: "expected an http:// or https:// scheme".to_string(),
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ValidationError::InvalidBaseUrl {
            url: url.clone(),
            reason: "missing host".to_string(),
        });
    }

    Ok(())
}

/// The prefix lands verbatim in archive file names, so it is held to the
/// same character set as sanitized prompt fragments
fn validate_filename_prefix(config: &Config) -> Result<(), ValidationError> {
    let prefix = &config.archive.filename_prefix;

    if prefix.is_empty() {
        return Err(ValidationError::EmptyFilenamePrefix);
    }

    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::UnsafeFilenamePrefix {
            prefix: prefix.clone(),
        });
    }

    Ok(())
}

/// Zero timeouts would fail every request; a zero request delay is fine
fn validate_timeouts(config: &Config) -> Result<(), ValidationError> {
    if config.api.connect_timeout.as_duration().is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout".to_string(),
        });
    }

    if config.api.status_timeout.as_duration().is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "status_timeout".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://service.example.com".to_string();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_host() {
        let mut config = Config::default();
        config.api.base_url = "https://".to_string();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let mut config = Config::default();
        config.archive.filename_prefix = String::new();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::EmptyFilenamePrefix)));
    }

    #[test]
    fn test_rejects_unsafe_prefix() {
        let mut config = Config::default();
        config.archive.filename_prefix = "my archive!".to_string();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::UnsafeFilenamePrefix { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_status_timeout() {
        let mut config = Config::default();
        config.api.status_timeout = HumanDuration::from_millis(0);

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::ZeroTimeout { .. })));
    }

    #[test]
    fn test_zero_request_delay_allowed() {
        let mut config = Config::default();
        config.api.request_delay = HumanDuration::from_millis(0);

        assert!(validate(&config).is_ok());
    }
}
