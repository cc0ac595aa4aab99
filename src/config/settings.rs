//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub photos: PhotoConfig,
    pub reports: ReportConfig,
    pub directory: DirectoryConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Local record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Photo storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// App-private directory; photos live under `{root_dir}/s5_photos`
    pub root_dir: PathBuf,
    pub retention_days: u64,
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub solution_char_budget: usize,
    pub solutions_per_problem: usize,
}

/// Which document store backs the directory service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    Memory,
    Redis,
}

/// Remote directory configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub invite_code_attempts: u32,
    pub chat_page_size: usize,
}

/// Federated sign-in configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret used to verify HS256 ID tokens
    pub token_secret: String,
    pub issuer: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://s5_audit.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data"),
            retention_days: 30,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            solution_char_budget: 150,
            solutions_per_problem: 2,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::Memory,
            redis_url: None,
            key_prefix: "s5audit:".to_string(),
            invite_code_attempts: 5,
            chat_page_size: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("S5AUDIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::AuditError> {
        super::validation::validate_settings(self)
    }
}
