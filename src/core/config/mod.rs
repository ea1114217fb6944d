//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`OCTOPUS_URL`, `OCTOPUS_SPACE`, `CI`)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$OCTOPUS_CLI_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/octopus/config.toml`
//! 3. `~/.octopus/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use octopus_cli::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! if let Some(host) = config.host() {
//!     println!("Server: {}", host);
//! }
//! println!("Output: {}", config.output_format());
//! ```

pub mod schema;

pub use schema::{validate_host, CliConfig, OUTPUT_FORMATS};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Values taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `OCTOPUS_URL`
    pub host: Option<String>,
    /// `OCTOPUS_SPACE`
    pub space: Option<String>,
    /// `OCTOPUS_API_KEY`
    pub api_key: Option<String>,
    /// `CI` is set to anything but empty, `0` or `false`
    pub ci: bool,
}

impl EnvOverrides {
    /// Capture the current environment.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            host: non_empty("OCTOPUS_URL"),
            space: non_empty("OCTOPUS_SPACE"),
            api_key: non_empty("OCTOPUS_API_KEY"),
            ci: non_empty("CI")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false"))
                .unwrap_or(false),
        }
    }
}

/// Merged configuration from the config file and the environment.
///
/// Accessor methods apply precedence rules automatically.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Contents of the config file
    pub file: CliConfig,
    /// Environment overrides
    pub env: EnvOverrides,
    /// Path the file was loaded from
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let (file, path) = Self::load_file()?;
        file.validate()?;
        debug!(path = ?path, "loaded config");
        Ok(Self {
            file,
            env: EnvOverrides::from_env(),
            path,
        })
    }

    /// Build a config from explicit parts.
    pub fn from_parts(file: CliConfig, env: EnvOverrides) -> Self {
        Self {
            file,
            env,
            path: None,
        }
    }

    /// Use `path` for [`save`](Self::save) instead of the canonical location.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn load_file() -> Result<(CliConfig, Option<PathBuf>), ConfigError> {
        // An explicit override is also where writes go, so it wins even
        // when the file does not exist yet.
        if let Ok(path) = std::env::var("OCTOPUS_CLI_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
            return Ok((CliConfig::default(), Some(path)));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("octopus/config.toml");
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".octopus/config.toml");
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        Ok((CliConfig::default(), None))
    }

    /// Read, parse and validate a config file.
    pub fn read_file(path: &Path) -> Result<CliConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: CliConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the canonical config path, `~/.octopus/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".octopus/config.toml"))
    }

    /// Write the file section back to where it was loaded from, or to the
    /// canonical path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Self::default_path()?,
        };
        Self::write_file(&path, &self.file)?;
        Ok(path)
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed and writes through a temp file
    /// and rename.
    pub fn write_file(path: &Path, config: &CliConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Server URL, without a trailing slash.
    ///
    /// Returns `None` if not configured.
    pub fn host(&self) -> Option<&str> {
        self.env
            .host
            .as_deref()
            .or(self.file.host.as_deref())
            .map(|h| h.trim_end_matches('/'))
    }

    /// Space name or ID. `None` means the server's default space.
    pub fn space(&self) -> Option<&str> {
        self.env.space.as_deref().or(self.file.space.as_deref())
    }

    /// API key from the environment, if any.
    pub fn env_api_key(&self) -> Option<&str> {
        self.env.api_key.as_deref()
    }

    /// Check if prompts are disabled.
    ///
    /// True when configured, or when running under CI.
    pub fn no_prompt(&self) -> bool {
        self.env.ci || self.file.no_prompt.unwrap_or(false)
    }

    /// Default output format.
    ///
    /// Defaults to "table" if not configured.
    pub fn output_format(&self) -> &str {
        self.file.output_format.as_deref().unwrap_or("table")
    }

    /// Get the path of the config file in use.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
