//! TOML-based configuration for the relay server.
//!
//! Reads `RelayConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\TcpRelay\config.toml`
//! - Linux:    `~/.config/tcp-relay/config.toml`
//! - macOS:    `~/Library/Application Support/TcpRelay/config.toml`
//!
//! The server never writes this file; it is operator-authored.  A missing
//! file yields `RelayConfig::default()`, so the server starts argument-free
//! out of the box.  A malformed file is a fatal setup error.
//!
//! Fields annotated with `#[serde(default = "some_fn")]` fall back to the
//! return value of `some_fn()` when absent from the TOML file, so a partial
//! config (or one written for an older version) keeps working.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use relay_core::{DEFAULT_PORT, RECV_BUFFER_LEN};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// General server behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Network port, address, and sizing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// TCP port the relay listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// IPv4 address to bind the listener to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Depth of the pending-connection queue maintained by the listener.
    #[serde(default = "default_listen_backlog")]
    pub listen_backlog: u32,
    /// Explicit ceiling on concurrently registered connections.  An accept
    /// beyond it is refused and logged; it is a configuration limit, not a
    /// protocol one.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Upper bound on a single read from a peer socket, in bytes.
    #[serde(default = "default_recv_buffer_len")]
    pub recv_buffer_len: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_listen_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_listen_backlog() -> u32 {
    10
}
fn default_max_connections() -> usize {
    64
}
fn default_recv_buffer_len() -> usize {
    RECV_BUFFER_LEN
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            bind_address: default_bind_address(),
            listen_backlog: default_listen_backlog(),
            max_connections: default_max_connections(),
            recv_buffer_len: default_recv_buffer_len(),
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `RelayConfig` from disk, returning `RelayConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<RelayConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: RelayConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RelayConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TcpRelay"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tcp-relay"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/TcpRelay
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TcpRelay")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
