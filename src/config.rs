//! # Configuration Management
//!
//! Centralized configuration for the listener, buffers and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`SHIPNET_*` variables)
//!
//! ## Tuning Notes
//! - Segment capacity is a throughput/memory trade-off; reads of exactly one
//!   segment are adopted without copying
//! - `max_events` bounds the work done per wake-up of the accept loop

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

use crate::core::buffer::DEFAULT_SEGMENT_CAPACITY;
use crate::core::codec::DEFAULT_MAX_STRING_LENGTH;

/// Largest packet a single copy may stage (2 MiB)
pub const MAX_PACKET_SIZE: usize = 2 * 1024 * 1024;

/// Readiness events handled per wake-up by default
pub const DEFAULT_MAX_EVENTS: usize = 64;

/// Default readiness wait before the accept loop wakes up idle
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Accept loop configuration
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Buffer and codec limits
    #[serde(default)]
    pub buffer: BufferConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SHIPNET_*` overrides read through `lookup`.
    ///
    /// Malformed numeric values are rejected rather than silently ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("SHIPNET_LISTEN_ADDRESS") {
            self.listener.address = addr;
        }

        if let Some(value) = lookup("SHIPNET_MAX_EVENTS") {
            self.listener.max_events = parse_env("SHIPNET_MAX_EVENTS", &value)?;
        }

        if let Some(value) = lookup("SHIPNET_WAIT_TIMEOUT_MS") {
            let millis: i64 = parse_env("SHIPNET_WAIT_TIMEOUT_MS", &value)?;
            self.listener.wait_timeout = u64::try_from(millis).ok().map(Duration::from_millis);
        }

        if let Some(value) = lookup("SHIPNET_SEGMENT_CAPACITY") {
            self.buffer.segment_capacity = parse_env("SHIPNET_SEGMENT_CAPACITY", &value)?;
        }

        if let Some(value) = lookup("SHIPNET_LOG_LEVEL") {
            self.logging.log_level = value.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid SHIPNET_LOG_LEVEL: {value}"))
            })?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.listener.validate());
        errors.extend(self.buffer.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid {key}: {value}")))
}

/// Accept loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Listen address (e.g., "0.0.0.0:25565")
    pub address: String,

    /// Maximum readiness events handled per wake-up
    pub max_events: usize,

    /// Readiness wait timeout; absent means wait indefinitely
    #[serde(default, with = "opt_duration_serde")]
    pub wait_timeout: Option<Duration>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0:25565"),
            max_events: DEFAULT_MAX_EVENTS,
            wait_timeout: Some(DEFAULT_WAIT_TIMEOUT),
        }
    }
}

impl ListenerConfig {
    /// Validate listener configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Listen address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid listen address format: '{}' (expected format: '0.0.0.0:25565')",
                self.address
            ));
        }

        if self.max_events == 0 {
            errors.push("Max events must be greater than 0".to_string());
        } else if self.max_events > 65_536 {
            errors.push(format!(
                "Max events too large: {} (maximum: 65536)",
                self.max_events
            ));
        }

        if let Some(timeout) = self.wait_timeout {
            if timeout.as_secs() > 3600 {
                errors.push("Wait timeout too long (maximum: 1 hour)".to_string());
            }
        }

        errors
    }
}

/// Buffer and codec limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BufferConfig {
    /// Capacity of a single buffer segment in bytes
    pub segment_capacity: usize,

    /// Default bound on decoded string length in bytes
    pub max_string_length: u32,

    /// Largest packet staged through a scratch buffer
    pub max_packet_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            segment_capacity: DEFAULT_SEGMENT_CAPACITY,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

impl BufferConfig {
    /// Validate buffer configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.segment_capacity < 64 {
            errors.push(format!(
                "Segment capacity too small: {} bytes (minimum: 64)",
                self.segment_capacity
            ));
        } else if self.segment_capacity > 16 * 1024 * 1024 {
            errors.push(format!(
                "Segment capacity too large: {} bytes (maximum: 16 MB)",
                self.segment_capacity
            ));
        }

        if self.max_string_length == 0 {
            errors.push("Max string length must be greater than 0".to_string());
        }

        if self.max_packet_size == 0 {
            errors.push("Max packet size cannot be 0".to_string());
        } else if self.max_packet_size > 100 * 1024 * 1024 {
            errors.push(format!(
                "Max packet size too large: {} bytes (maximum recommended: 100 MB)",
                self.max_packet_size
            ));
        }

        if self.max_string_length as usize > self.max_packet_size {
            errors.push("Max string length cannot be larger than max packet size".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("shipnet"),
            log_level: Level::INFO,
            log_to_console: true,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for optional Duration serialization as milliseconds
mod opt_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| d.as_millis() as u64)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
