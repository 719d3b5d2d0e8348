//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables, merging them with proper precedence, and turning the result
//! into a [`ClientConfig`].

use crate::error::WhoisError;
use crate::types::{ClientConfig, MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [client]
/// timeout = "5s"
/// concurrency = 4
/// root_server = "whois.iana.org"
///
/// [output]
/// json = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Network and batching settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSection>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Settings that map onto [`ClientConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientSection {
    /// Timeout as a string, e.g. "5s", "30s", "2m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Default WHOIS port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Root registry for authority resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_server: Option<String>,

    /// Port of the root registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_port: Option<u16>,

    /// Batch concurrency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Response size cap in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_bytes: Option<usize>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Print JSON instead of text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,

    /// Print extracted fields instead of raw text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<bool>,

    /// Registry format name to force when parsing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FileConfig {
    /// Apply the `[client]` section on top of an existing client configuration.
    pub fn apply_to(&self, mut config: ClientConfig) -> Result<ClientConfig, WhoisError> {
        let Some(client) = &self.client else {
            return Ok(config);
        };

        if let Some(timeout) = &client.timeout {
            config.timeout = parse_timeout(timeout)?;
        }
        if let Some(port) = client.port {
            config.default_port = port;
        }
        if let Some(root_server) = &client.root_server {
            config.root_server = root_server.clone();
        }
        if let Some(root_port) = client.root_port {
            config.root_port = root_port;
        }
        if let Some(concurrency) = client.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(limit) = client.max_response_bytes {
            config.max_response_bytes = limit;
        }

        Ok(config)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were loaded
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `FileError` if the file is missing or unreadable, `ConfigError` if it
    /// does not parse or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config < home directory config < local config; values from a
    /// higher-precedence file override those of lower ones field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, WhoisError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            if self.verbose {
                debug!(path = %path.display(), "Loaded configuration file");
            }
            merged = self.merge_configs(merged, config);
        }

        Ok(merged)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./whois-getter.toml", "./.whois-getter.toml"]
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".whois-getter.toml", "whois-getter.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|p| p.exists())
    }

    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                env::var_os("HOME").map(|home| Path::new(&home).join(".config"))
            })?;

        let path = config_dir.join("whois-getter").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            client: match (lower.client, higher.client) {
                (Some(lower), Some(higher)) => Some(ClientSection {
                    timeout: higher.timeout.or(lower.timeout),
                    port: higher.port.or(lower.port),
                    root_server: higher.root_server.or(lower.root_server),
                    root_port: higher.root_port.or(lower.root_port),
                    concurrency: higher.concurrency.or(lower.concurrency),
                    max_response_bytes: higher.max_response_bytes.or(lower.max_response_bytes),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    json: higher.json.or(lower.json),
                    parse: higher.parse.or(lower.parse),
                    format: higher.format.or(lower.format),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisError> {
        if let Some(client) = &config.client {
            if let Some(concurrency) = client.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(WhoisError::config("Concurrency must be between 1 and 100"));
                }
            }

            if let Some(timeout) = &client.timeout {
                parse_timeout(timeout)?;
            }

            if let Some(root_server) = &client.root_server {
                if root_server.trim().is_empty() {
                    return Err(WhoisError::config("Root server cannot be empty"));
                }
            }

            if client.max_response_bytes == Some(0) {
                return Err(WhoisError::config("max_response_bytes must be positive"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration.
///
/// Values come from the `WG_*` variables; invalid ones are skipped with a
/// warning.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub root_server: Option<String>,
    pub port: Option<u16>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Apply the environment values on top of a client configuration.
    pub fn apply_to(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(root_server) = &self.root_server {
            config.root_server = root_server.clone();
        }
        if let Some(port) = self.port {
            config.default_port = port;
        }
        config
    }
}

/// Load configuration from environment variables.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

fn env_config_from<F: Fn(&str) -> Option<String>>(lookup: F) -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // WG_TIMEOUT - per-operation timeout
    if let Some(val) = lookup("WG_TIMEOUT") {
        match parse_timeout(&val) {
            Ok(timeout) => env_config.timeout = Some(timeout),
            Err(_) => warn!(value = %val, "Invalid WG_TIMEOUT, use format like '5s', '30s', '2m'"),
        }
    }

    // WG_CONCURRENCY - batch concurrency
    if let Some(val) = lookup("WG_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(n) if (1..=MAX_CONCURRENCY).contains(&n) => env_config.concurrency = Some(n),
            _ => warn!(value = %val, "Invalid WG_CONCURRENCY, must be 1-100"),
        }
    }

    // WG_ROOT_SERVER - root registry host
    if let Some(val) = lookup("WG_ROOT_SERVER") {
        if !val.trim().is_empty() {
            env_config.root_server = Some(val.trim().to_string());
        }
    }

    // WG_PORT - default WHOIS port
    if let Some(val) = lookup("WG_PORT") {
        match val.parse::<u16>() {
            Ok(port) if port > 0 => env_config.port = Some(port),
            _ => warn!(value = %val, "Invalid WG_PORT"),
        }
    }

    // WG_CONFIG - explicit configuration file
    if let Some(val) = lookup("WG_CONFIG") {
        if !val.trim().is_empty() {
            env_config.config = Some(val);
        }
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m", "500ms", or bare seconds.
pub fn parse_timeout(timeout_str: &str) -> Result<Duration, WhoisError> {
    let value = timeout_str.trim().to_lowercase();

    let parsed = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = value.strip_suffix('s') {
        s.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = value.strip_suffix('m') {
        m.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    };

    match parsed {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(WhoisError::config(format!(
            "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
            timeout_str
        ))),
    }
}
