//! Client configuration
//!
//! Connection settings for the backend plus export defaults. Values come
//! from a TOML file, from `FILIALE_*` environment variables, or both; the
//! environment wins.
//!
//! ```toml
//! api_url = "https://xyz.supabase.co"
//! api_key = "public-anon-key"
//! page_size = 500
//! output_dir = "exports"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "FILIALE_API_URL";
pub const ENV_API_KEY: &str = "FILIALE_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "FILIALE_ACCESS_TOKEN";
pub const ENV_PAGE_SIZE: &str = "FILIALE_PAGE_SIZE";
pub const ENV_OUTPUT_DIR: &str = "FILIALE_OUTPUT_DIR";

/// Default number of rows per page request
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, String),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Connection and export settings
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend project URL
    #[serde(default)]
    pub api_url: String,
    /// Public API key
    #[serde(default)]
    pub api_key: String,
    /// Access token of the signed-in user
    #[serde(default)]
    pub access_token: Option<String>,
    /// Rows requested per page during exports
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory exported files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            access_token: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

// Keys must never end up in logs
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Takes the lookup as a closure so tests do not have to touch the
    /// process environment.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            self.page_size = size.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a positive integer, got {}",
                    ENV_PAGE_SIZE, size
                ))
            })?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(self)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Load from an optional file, then the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "api_url is required (set it in the config file or {})",
                ENV_API_URL
            )));
        }
        if !(self.api_url.starts_with("https://") || self.api_url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must start with http:// or https://, got {}",
                self.api_url
            )));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "api_key is required (set it in the config file or {})",
                ENV_API_KEY
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied_for_missing_keys() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_url = "https://xyz.supabase.co"
            api_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_url = "https://file.example.com"
            api_key = "file-key"
            page_size = 100
            "#,
        )
        .unwrap()
        .apply_env_with(env(&[
            (ENV_API_URL, "https://env.example.com"),
            (ENV_PAGE_SIZE, "250"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://env.example.com");
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.page_size, 250);
    }

    #[test]
    fn test_invalid_page_size_env() {
        let result = ClientConfig::default().apply_env_with(env(&[(ENV_PAGE_SIZE, "lots")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_incomplete_config() {
        let mut config = ClientConfig::default();
        assert!(config.validate().is_err());

        config.api_url = "ftp://example.com".to_string();
        config.api_key = "anon".to_string();
        assert!(config.validate().is_err());

        config.api_url = "https://example.com".to_string();
        config.page_size = 0;
        assert!(config.validate().is_err());

        config.page_size = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig {
            api_key: "super-secret-key".to_string(),
            access_token: Some("jwt-token".to_string()),
            ..ClientConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
        assert!(!debug.contains("jwt-token"));
    }

    #[test]
    fn test_malformed_toml() {
        let result = ClientConfig::from_toml_str("api_url = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
