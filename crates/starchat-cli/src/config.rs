//! Configuration management for the CLI
//!
//! Configuration is read from the first file found among:
//! - the `--config` argument (or `STARCHAT_CONFIG`)
//! - `.starchat.{toml,yaml,json}` in the current directory
//! - `<config dir>/starchat/config.{toml,yaml,json}`
//! - `~/.starchat.{toml,yaml,json}`
//!
//! `STARCHAT_PASSWORD` overrides the server password from any source.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use starchat_core::http::ClientConfig;
use starchat_core::{StrictMode, VersionTag};
use std::path::{Path, PathBuf};

/// Environment variable holding the server password
pub const PASSWORD_ENV: &str = "STARCHAT_PASSWORD";

const CONFIG_EXTENSIONS: [&str; 3] = ["toml", "yaml", "json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tables: TablesConfig,
    pub output: OutputConfig,
    pub logging: LoggingSettings,
}

/// StarChat server connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheme and host
    pub url: String,
    pub port: u16,
    /// Server version, one of 4.1, 4.2 or 5.1
    pub version: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    /// Seconds between polls while the server is loading
    pub patience_secs: u64,
    pub trials: u32,
}

/// Decision-table defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Version assumed for table files when none is given
    pub default_version: String,
    /// Fail on unsupported versions instead of logging them
    pub strict: bool,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,
    /// Show progress spinners for server calls
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level used when no `-v` flag is given
    pub level: Option<String>,
    /// Log format (compact, full, json)
    pub format: Option<String>,
    /// Log file path
    pub file: Option<PathBuf>,
}

/// A default-location file that exists but could not be read
#[derive(Debug)]
pub struct SkippedConfig {
    pub path: PathBuf,
    pub error: Error,
}

impl std::fmt::Display for SkippedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Warning: ignoring config file {}: {}",
            self.path.display(),
            self.error
        )
    }
}

/// Configuration plus the default-location files passed over on the way
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub skipped: Vec<SkippedConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            url: client.url,
            port: client.port,
            version: client.version.to_string(),
            username: None,
            password: None,
            timeout_secs: client.timeout_secs,
            patience_secs: client.patience_secs,
            trials: client.trials,
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            default_version: VersionTag::default().to_string(),
            strict: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from a file, picking the format from its extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match extension(path) {
            Some("toml") => toml::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "a .toml, .yaml or .json file".to_string(),
                })
            }
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> LoadedConfig {
        Self::load_from_paths(&Self::default_config_paths())
    }

    /// First readable file among `paths`, or the defaults
    ///
    /// Files that exist but fail to parse are skipped and returned so the
    /// caller can report them.
    pub fn load_from_paths(paths: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();
        for path in paths.iter().filter(|path| path.exists()) {
            match Self::from_file(path) {
                Ok(config) => {
                    return LoadedConfig { config, skipped };
                }
                Err(error) => skipped.push(SkippedConfig {
                    path: path.clone(),
                    error,
                }),
            }
        }

        LoadedConfig {
            config: Self::default(),
            skipped,
        }
    }

    /// Load configuration from a specific file or default locations
    ///
    /// An explicitly given file must load; default locations only produce
    /// [`SkippedConfig`] entries.
    pub fn load_with_file(file: Option<&Path>) -> Result<LoadedConfig> {
        let mut loaded = match file {
            Some(path) => LoadedConfig {
                config: Self::from_file(path)?,
                skipped: Vec::new(),
            },
            None => Self::load(),
        };
        loaded.config.apply_env();
        Ok(loaded)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            self.server.password = Some(password);
        }
    }

    /// Default configuration file paths, in lookup order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = CONFIG_EXTENSIONS
            .iter()
            .map(|ext| PathBuf::from(format!(".starchat.{}", ext)))
            .collect();

        if let Some(config_dir) = dirs::config_dir() {
            let starchat_dir = config_dir.join("starchat");
            paths.extend(
                CONFIG_EXTENSIONS
                    .iter()
                    .map(|ext| starchat_dir.join(format!("config.{}", ext))),
            );
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.extend(
                CONFIG_EXTENSIONS
                    .iter()
                    .map(|ext| home_dir.join(format!(".starchat.{}", ext))),
            );
        }

        paths
    }

    /// Strictness for decision-table operations
    pub fn strict_mode(&self, lenient: bool) -> StrictMode {
        if lenient || !self.tables.strict {
            StrictMode::Warn
        } else {
            StrictMode::Strict
        }
    }

    /// Table version given on the command line, or the configured default
    pub fn table_version(&self, requested: Option<&str>) -> VersionTag {
        VersionTag::new(requested.unwrap_or(self.tables.default_version.as_str()))
    }

    /// Settings for the StarChat HTTP client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.server.url.clone(),
            port: self.server.port,
            version: VersionTag::new(self.server.version.as_str()),
            timeout_secs: self.server.timeout_secs,
            patience_secs: self.server.patience_secs,
            trials: self.server.trials,
        }
    }

    /// Copy with the password masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.server.password.is_some() {
            config.server.password = Some("***".to_string());
        }
        config
    }

    /// Save configuration to a file, picking the format from its extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match extension(path) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            Some("json") => serde_json::to_string_pretty(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}
