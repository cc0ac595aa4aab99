//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::settings::{
    AuthConfig, DatabaseConfig, DirectoryBackend, DirectoryConfig, LoggingConfig, PhotoConfig,
    ReportConfig,
};
use super::Settings;
use crate::utils::errors::{AuditError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_photo_config(&settings.photos)?;
    validate_report_config(&settings.reports)?;
    validate_directory_config(&settings.directory)?;
    validate_auth_config(&settings.auth)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AuditError::Config("Database URL is required".to_string()));
    }

    if !config.url.starts_with("sqlite:") {
        return Err(AuditError::Config(format!(
            "Database URL must use the sqlite scheme: {}",
            config.url
        )));
    }

    if config.max_connections == 0 {
        return Err(AuditError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AuditError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

fn validate_photo_config(config: &PhotoConfig) -> Result<()> {
    if config.root_dir.as_os_str().is_empty() {
        return Err(AuditError::Config("Photo root directory is required".to_string()));
    }

    if config.retention_days == 0 {
        return Err(AuditError::Config(
            "Photo retention must be at least one day".to_string(),
        ));
    }

    Ok(())
}

fn validate_report_config(config: &ReportConfig) -> Result<()> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(AuditError::Config("Report output directory is required".to_string()));
    }

    // Room for the ellipsis.
    if config.solution_char_budget < 4 {
        return Err(AuditError::Config(
            "Solution character budget must be at least 4".to_string(),
        ));
    }

    Ok(())
}

/// Validate directory configuration
fn validate_directory_config(config: &DirectoryConfig) -> Result<()> {
    if config.backend == DirectoryBackend::Redis
        && config.redis_url.as_deref().map_or(true, str::is_empty)
    {
        return Err(AuditError::Config(
            "Redis URL is required for the redis directory backend".to_string(),
        ));
    }

    if config.invite_code_attempts == 0 {
        return Err(AuditError::Config(
            "Invite code attempts must be greater than 0".to_string(),
        ));
    }

    if config.chat_page_size == 0 {
        return Err(AuditError::Config(
            "Chat page size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_auth_config(config: &AuthConfig) -> Result<()> {
    if config.token_secret.is_empty() {
        return Err(AuditError::Config("Auth token secret is required".to_string()));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AuditError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AuditError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.token_secret = "test-secret".to_string();
        settings
    }

    #[test]
    fn test_defaults_validate_once_secret_is_set() {
        assert!(Settings::default().validate().is_err());
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut settings = valid_settings();
        settings.directory.backend = DirectoryBackend::Redis;
        assert!(settings.validate().is_err());

        settings.directory.redis_url = Some("redis://localhost:6379".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_sqlite_url_and_bad_level() {
        let mut settings = valid_settings();
        settings.database.url = "postgresql://localhost/audit".to_string();
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(settings.validate().is_err());
    }
}
