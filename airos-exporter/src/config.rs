//! Configuration for the airOS exporter.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use airos_common::LoggingConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP endpoint settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Device access settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Session retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Scrape worker settings.
    #[serde(default)]
    pub workers: WorkersConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to listen on (default: "0.0.0.0").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Port to listen on (default: 8890).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8890
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            path: default_path(),
        }
    }
}

impl HttpConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.listen.parse().map_err(|_| {
            ConfigError::Validation(format!("Invalid listen address: {}", self.listen))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Device credentials and SSH settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// SSH user (default: "ubnt").
    #[serde(default = "default_credential")]
    pub username: String,

    /// Password shared by every polled device (default: "ubnt").
    #[serde(default = "default_credential")]
    pub password: String,

    /// SSH port used when the target carries none (default: 22).
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
}

fn default_credential() -> String {
    "ubnt".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            username: default_credential(),
            password: default_credential(),
            ssh_port: default_ssh_port(),
        }
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ssh_port", &self.ssh_port)
            .finish()
    }
}

/// Session retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Filtered attempts before the final one (default: 9).
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Pause between attempts in milliseconds (default: 2000).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_attempts() -> u32 {
    9
}

fn default_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Scrape worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Number of worker threads (default: 8).
    #[serde(default = "default_workers")]
    pub count: usize,

    /// Pending scrapes queued before requests wait (default: 64).
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_workers() -> usize {
    8
}

fn default_queue_depth() -> usize {
    64
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: default_workers(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.count == 0 {
            return Err(ConfigError::Validation(
                "workers.count must be > 0".to_string(),
            ));
        }

        if self.workers.queue_depth == 0 {
            return Err(ConfigError::Validation(
                "workers.queue_depth must be > 0".to_string(),
            ));
        }

        if self.http.port == 0 {
            return Err(ConfigError::Validation("http.port must be > 0".to_string()));
        }

        self.http.socket_addr()?;

        if !self.http.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        Ok(())
    }
}
