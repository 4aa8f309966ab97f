//! Configuration module for cos-speedtest
//!
//! Handles loading and parsing of the JSON credentials document with support
//! for environment variable expansion and validation.
//!
//! The document carries four required fields plus an optional endpoint
//! override:
//!
//! ```json
//! {
//!     "SecretID": "AKIDEXAMPLE",
//!     "SecretKey": "${COS_SECRET_KEY}",
//!     "Region": "ap-guangzhou",
//!     "Bucket": "examplebucket-1250000000"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Default location of the configuration document
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
fn expand_env_vars(s: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Custom deserializer for strings with environment variable expansion.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

fn deserialize_optional_with_env<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(|s| expand_env_vars(&s)))
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// COS access configuration
///
/// Field names follow the COS sample document layout (`SecretID`, `SecretKey`,
/// `Region`, `Bucket`); snake_case spellings are accepted as aliases.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(
        rename = "SecretID",
        alias = "SecretId",
        alias = "secret_id",
        deserialize_with = "deserialize_with_env"
    )]
    pub secret_id: String,

    #[serde(
        rename = "SecretKey",
        alias = "secret_key",
        deserialize_with = "deserialize_with_env"
    )]
    pub secret_key: String,

    #[serde(
        rename = "Region",
        alias = "region",
        deserialize_with = "deserialize_with_env"
    )]
    pub region: String,

    #[serde(
        rename = "Bucket",
        alias = "bucket",
        deserialize_with = "deserialize_with_env"
    )]
    pub bucket: String,

    /// Replaces the derived `http://<bucket>.cos.<region>.myqcloud.com`
    #[serde(
        rename = "Endpoint",
        alias = "endpoint",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_with_env"
    )]
    pub endpoint: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("SecretID", &self.secret_id),
            ("SecretKey", &self.secret_key),
            ("Region", &self.region),
            ("Bucket", &self.bucket),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        // Region and bucket become part of the endpoint host name
        for (field, value) in [("Region", &self.region), ("Bucket", &self.bucket)] {
            if !value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(ConfigError::ValidationError(format!(
                    "{} '{}' may only contain letters, digits and '-'",
                    field, value
                )));
            }
        }

        if let Some(ref endpoint) = self.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(
                    "Invalid Endpoint: must start with http:// or https://".into(),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
