//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Config File
//!
//! Located at (in order of precedence):
//! 1. `$OCTOPUS_CLI_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/octopus/config.toml`
//! 3. `~/.octopus/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., host must be an http(s) URL).

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Output formats accepted by `--output-format` and the `output-format` key.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json", "basic"];

/// User configuration.
///
/// # Example
///
/// ```toml
/// host = "https://example.octopus.app"
/// space = "Default"
/// no_prompt = false
/// output_format = "table"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Octopus server URL
    pub host: Option<String>,

    /// Space name or ID
    pub space: Option<String>,

    /// Disable interactive prompts
    pub no_prompt: Option<bool>,

    /// Default output format
    pub output_format: Option<String>,
}

impl CliConfig {
    /// Keys accepted by `config get` and `config set`.
    pub const KEYS: &'static [&'static str] = &["host", "space", "no-prompt", "output-format"];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            validate_host(host)?;
        }

        if let Some(space) = &self.space {
            if space.trim().is_empty() {
                return Err(ConfigError::InvalidValue("space cannot be empty".to_string()));
            }
        }

        if let Some(format) = &self.output_format {
            if !OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid output format '{}', must be one of: {}",
                    format,
                    OUTPUT_FORMATS.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Read a key as a display string.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "host" => self.host.clone(),
            "space" => self.space.clone(),
            "no-prompt" => self.no_prompt.map(|v| v.to_string()),
            "output-format" => self.output_format.clone(),
            other => return Err(unknown_key(other)),
        };
        Ok(value)
    }

    /// Set a key from a string, validating the result.
    ///
    /// An empty value clears the key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let cleared = value.is_empty();
        match key {
            "host" => {
                self.host = (!cleared).then(|| value.trim_end_matches('/').to_string());
            }
            "space" => self.space = (!cleared).then(|| value.to_string()),
            "no-prompt" => {
                self.no_prompt = if cleared {
                    None
                } else {
                    Some(value.parse::<bool>().map_err(|_| {
                        ConfigError::InvalidValue(format!(
                            "invalid value '{}' for no-prompt, expected true or false",
                            value
                        ))
                    })?)
                };
            }
            "output-format" => self.output_format = (!cleared).then(|| value.to_string()),
            other => return Err(unknown_key(other)),
        }
        self.validate()
    }

    /// All keys with their values, in `KEYS` order.
    pub fn entries(&self) -> Vec<(&'static str, Option<String>)> {
        Self::KEYS
            .iter()
            .map(|key| (*key, self.get(key).ok().flatten()))
            .collect()
    }
}

/// Check that a host is an absolute http(s) URL.
pub fn validate_host(host: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(host)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid host '{}': {}", host, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(format!(
            "invalid host '{}': scheme must be http or https",
            host
        )));
    }
    Ok(url)
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "unknown config key '{}', must be one of: {}",
        key,
        CliConfig::KEYS.join(", ")
    ))
}
