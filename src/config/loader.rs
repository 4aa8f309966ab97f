//! Configuration loader

use super::{Config, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a JSON file
    ///
    /// Fails if the file is missing or unreadable, is not valid JSON, lacks
    /// a required field, or does not pass [`Config::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), region = %config.region, "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate a configuration document
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
