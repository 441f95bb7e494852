//! Configuration management for pcmd-ap
//!
//! Bootstrap settings come from an optional TOML file; command-line flags
//! (and their `PCMD_*` environment fallbacks) override individual keys.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments / environment variables
//! 2. TOML configuration file (`--config`, else `<config dir>/pcmd/config.toml`)
//! 3. Built-in defaults (code constants)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration loaded from TOML file
///
/// Every key is optional; missing keys fall back to built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Address to accept control connections on
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Control port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Folder relative PLAY filenames are resolved against
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Sink status poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-connection read/write timeout in milliseconds (0 = none)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,

    /// Output device buffer size in frames
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: u32,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            root_folder: None,
            poll_interval_ms: default_poll_interval_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
            device: None,
            buffer_frames: default_buffer_frames(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    4044
}

fn default_poll_interval_ms() -> u64 {
    pcmd_common::pcm::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_connection_timeout_ms() -> u64 {
    5000
}

fn default_buffer_frames() -> u32 {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<IpAddr>,
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub connection_timeout_ms: Option<u64>,
    pub device: Option<String>,
    pub log_level: Option<String>,
}

/// Complete, validated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub root_folder: Option<PathBuf>,
    pub poll_interval: Duration,
    pub connection_timeout: Option<Duration>,
    pub device: Option<String>,
    pub buffer_frames: u32,
    pub log_level: String,
}

impl Config {
    /// Load configuration from TOML (if any) and apply overrides
    ///
    /// # Arguments
    ///
    /// - `toml_path`: Explicit config file; when None the platform default
    ///   location is used if a file exists there
    /// - `overrides`: Command-line overrides
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file cannot be read, any file fails to
    /// parse, or the merged values are invalid.
    pub async fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match toml_path {
            Some(path) => Self::read_toml(path).await?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::read_toml(&path).await?,
                None => {
                    debug!("No config file found, using built-in defaults");
                    TomlConfig::default()
                }
            },
        };

        Self::from_parts(toml_config, overrides)
    }

    async fn read_toml(path: &Path) -> Result<TomlConfig> {
        let toml_str = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::parse_toml(&toml_str)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Parse a TOML document into bootstrap settings
    pub fn parse_toml(toml_str: &str) -> Result<TomlConfig> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Merge file settings with overrides and validate
    pub fn from_parts(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let bind_address = overrides.bind_address.unwrap_or(toml_config.bind_address);
        let port = overrides.port.unwrap_or(toml_config.port);

        let poll_interval_ms = overrides
            .poll_interval_ms
            .unwrap_or(toml_config.poll_interval_ms);
        if poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".to_string()));
        }

        let connection_timeout_ms = overrides
            .connection_timeout_ms
            .unwrap_or(toml_config.connection_timeout_ms);

        let buffer_frames = toml_config.buffer_frames;
        if buffer_frames == 0 {
            return Err(Error::Config("buffer_frames must be greater than 0".to_string()));
        }

        let root_folder = overrides.root_folder.or(toml_config.root_folder);
        if let Some(ref folder) = root_folder {
            info!("Root folder: {:?}", folder);
        }

        Ok(Config {
            listen_addr: SocketAddr::new(bind_address, port),
            root_folder,
            poll_interval: Duration::from_millis(poll_interval_ms),
            connection_timeout: (connection_timeout_ms > 0)
                .then(|| Duration::from_millis(connection_timeout_ms)),
            device: overrides.device.or(toml_config.device),
            buffer_frames,
            log_level: overrides.log_level.unwrap_or(toml_config.logging.level),
        })
    }
}

/// Platform config file location (`~/.config/pcmd/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pcmd").join("config.toml"))
}
