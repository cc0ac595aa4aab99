//! Settings loading from the environment

use s5_audit::config::{DirectoryBackend, Settings};
use serial_test::serial;

const VARS: [&str; 5] = [
    "S5AUDIT__AUTH__TOKEN_SECRET",
    "S5AUDIT__DATABASE__MAX_CONNECTIONS",
    "S5AUDIT__DIRECTORY__BACKEND",
    "S5AUDIT__DIRECTORY__REDIS_URL",
    "S5AUDIT__PHOTOS__RETENTION_DAYS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let settings = Settings::new().expect("Failed to load settings");
    assert_eq!(settings.directory.backend, DirectoryBackend::Memory);
    assert_eq!(settings.photos.retention_days, 30);
    assert_eq!(settings.reports.solutions_per_problem, 2);
    // No secret configured yet
    assert!(settings.validate().is_err());
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    std::env::set_var("S5AUDIT__AUTH__TOKEN_SECRET", "plant-secret");
    std::env::set_var("S5AUDIT__DATABASE__MAX_CONNECTIONS", "8");
    std::env::set_var("S5AUDIT__DIRECTORY__BACKEND", "redis");
    std::env::set_var("S5AUDIT__DIRECTORY__REDIS_URL", "redis://localhost:6379");
    std::env::set_var("S5AUDIT__PHOTOS__RETENTION_DAYS", "14");

    let settings = Settings::new().expect("Failed to load settings");
    clear_env();

    assert_eq!(settings.auth.token_secret, "plant-secret");
    assert_eq!(settings.database.max_connections, 8);
    assert_eq!(settings.directory.backend, DirectoryBackend::Redis);
    assert_eq!(settings.directory.redis_url.as_deref(), Some("redis://localhost:6379"));
    assert_eq!(settings.photos.retention_days, 14);
    settings.validate().expect("Overridden settings should validate");
}
