//! # Runtime Configuration Module
//!
//! Settings for the `may` runtime and the listener, resolved in this order
//! (later wins):
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables
//! 4. command-line flags (applied by the binary)
//!
//! ## Environment Variables
//!
//! | Variable             | Field        | Format                                  |
//! |----------------------|--------------|-----------------------------------------|
//! | `WEBTRIE_STACK_SIZE` | `stack_size` | decimal (`16384`) or hex (`0x4000`)     |
//! | `WEBTRIE_WORKERS`    | `workers`    | decimal                                 |
//! | `WEBTRIE_ADDR`       | `addr`       | `host:port`                             |
//! | `WEBTRIE_TEMPLATES`  | `templates`  | directory path                          |
//!
//! ## Example File
//!
//! ```toml
//! addr = "0.0.0.0:8080"
//! stack_size = 0x8000
//! workers = 4
//! templates = "templates"
//! ```
//!
//! Stack size is per coroutine, so total reserved memory grows with
//! concurrency: 16 KB suits simple handlers, 32-64 KB deeper call chains.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default coroutine stack size (16 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Error loading the runtime configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`RuntimeConfig`]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },
    /// An environment variable holds an invalid value
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config file {}: {source}", path.display())
            }
            ConfigError::InvalidEnv { var, value } => {
                write!(f, "invalid value '{value}' for environment variable {var}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidEnv { .. } => None,
        }
    }
}

/// Runtime configuration.
///
/// Load it at startup and call [`apply`](Self::apply) before starting the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    /// `may` worker threads; `None` keeps the runtime default
    pub workers: Option<usize>,
    /// Listen address
    pub addr: String,
    /// Template directory for the bundled engine
    pub templates: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            workers: None,
            addr: DEFAULT_ADDR.to_string(),
            templates: None,
        }
    }
}

/// Parse `16384` or `0x4000`.
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] for an unparsable numeric variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment.
    ///
    /// # Errors
    ///
    /// File read or parse failures and invalid environment values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a TOML file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Runtime config file loaded");
        Ok(config)
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] for an unparsable numeric variable.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("WEBTRIE_STACK_SIZE") {
            self.stack_size = parse_size(&value).ok_or(ConfigError::InvalidEnv {
                var: "WEBTRIE_STACK_SIZE",
                value,
            })?;
        }
        if let Some(value) = lookup("WEBTRIE_WORKERS") {
            let workers = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: "WEBTRIE_WORKERS",
                    value: value.clone(),
                })?;
            self.workers = Some(workers);
        }
        if let Some(value) = lookup("WEBTRIE_ADDR") {
            self.addr = value;
        }
        if let Some(value) = lookup("WEBTRIE_TEMPLATES") {
            self.templates = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Configure the global `may` runtime.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        if let Some(workers) = self.workers {
            may::config().set_workers(workers);
        }
        debug!(
            stack_size = self.stack_size,
            workers = ?self.workers,
            "Coroutine runtime configured"
        );
    }
}
