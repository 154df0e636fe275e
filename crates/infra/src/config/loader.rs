//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `FIELDSYNC_STORE_PATH` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `FIELDSYNC_STORE_PATH`: Queue database or file path (required)
//! - `FIELDSYNC_STORE_BACKEND`: `sqlite` or `file`
//! - `FIELDSYNC_STORE_POOL_SIZE`: Connection pool size
//! - `FIELDSYNC_REPLAY_MAX_ATTEMPTS`: Attempt ceiling per queued mutation
//! - `FIELDSYNC_REPLAY_INTERVAL`: Background flush interval in seconds
//! - `FIELDSYNC_REPLAY_TIMEOUT`: Upper bound for one flush pass in seconds
//! - `FIELDSYNC_REPLAY_ENABLED`: Whether background replay runs (true/false)
//! - `FIELDSYNC_API_BASE_URL`: Base URL for relative mutation targets
//! - `FIELDSYNC_API_TIMEOUT`: Per-request timeout in seconds
//! - `FIELDSYNC_API_USER_AGENT`: User agent sent with every request
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./fieldsync.json` or `./fieldsync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use fieldsync_domain::{Config, FieldSyncError, Result, StoreBackend};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FieldSyncError::Config` if configuration cannot be loaded from
/// either source or fails validation.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `FIELDSYNC_STORE_PATH` is required; every other setting falls back
/// to its default.
///
/// # Errors
/// Returns `FieldSyncError::Config` if the store path is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.store.path = env_var("FIELDSYNC_STORE_PATH")?;
    if let Some(backend) = env_parse::<StoreBackend>("FIELDSYNC_STORE_BACKEND")? {
        config.store.backend = backend;
    }
    if let Some(pool_size) = env_parse("FIELDSYNC_STORE_POOL_SIZE")? {
        config.store.pool_size = pool_size;
    }

    if let Some(max_attempts) = env_parse("FIELDSYNC_REPLAY_MAX_ATTEMPTS")? {
        config.replay.max_attempts = max_attempts;
    }
    if let Some(interval) = env_parse("FIELDSYNC_REPLAY_INTERVAL")? {
        config.replay.flush_interval_seconds = interval;
    }
    if let Some(timeout) = env_parse("FIELDSYNC_REPLAY_TIMEOUT")? {
        config.replay.flush_timeout_seconds = timeout;
    }
    config.replay.enabled = env_bool("FIELDSYNC_REPLAY_ENABLED", config.replay.enabled);

    config.api.base_url = std::env::var("FIELDSYNC_API_BASE_URL").ok();
    if let Some(timeout) = env_parse("FIELDSYNC_API_TIMEOUT")? {
        config.api.request_timeout_seconds = timeout;
    }
    config.api.user_agent = std::env::var("FIELDSYNC_API_USER_AGENT").ok();

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FieldSyncError::Config` if the file is missing, malformed or
/// fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FieldSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FieldSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FieldSyncError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content, detecting the format by the
/// file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FieldSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FieldSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FieldSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.extend(candidates_in(&cwd.join("..")));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("fieldsync.json"),
        dir.join("fieldsync.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FieldSyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable.
///
/// Returns `Ok(None)` when unset and a config error when set but unparseable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FieldSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 10] = [
        "FIELDSYNC_STORE_PATH",
        "FIELDSYNC_STORE_BACKEND",
        "FIELDSYNC_STORE_POOL_SIZE",
        "FIELDSYNC_REPLAY_MAX_ATTEMPTS",
        "FIELDSYNC_REPLAY_INTERVAL",
        "FIELDSYNC_REPLAY_TIMEOUT",
        "FIELDSYNC_REPLAY_ENABLED",
        "FIELDSYNC_API_BASE_URL",
        "FIELDSYNC_API_TIMEOUT",
        "FIELDSYNC_API_USER_AGENT",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("FIELDSYNC_TEST_BOOL_ON", "On");
        std::env::set_var("FIELDSYNC_TEST_BOOL_OFF", "0");
        std::env::remove_var("FIELDSYNC_TEST_BOOL_MISSING");

        assert!(env_bool("FIELDSYNC_TEST_BOOL_ON", false));
        assert!(!env_bool("FIELDSYNC_TEST_BOOL_OFF", true));
        assert!(env_bool("FIELDSYNC_TEST_BOOL_MISSING", true));

        std::env::remove_var("FIELDSYNC_TEST_BOOL_ON");
        std::env::remove_var("FIELDSYNC_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("FIELDSYNC_STORE_PATH", "/tmp/queue.json");
        std::env::set_var("FIELDSYNC_STORE_BACKEND", "FILE");
        std::env::set_var("FIELDSYNC_STORE_POOL_SIZE", "2");
        std::env::set_var("FIELDSYNC_REPLAY_MAX_ATTEMPTS", "5");
        std::env::set_var("FIELDSYNC_REPLAY_INTERVAL", "15");
        std::env::set_var("FIELDSYNC_REPLAY_TIMEOUT", "60");
        std::env::set_var("FIELDSYNC_REPLAY_ENABLED", "false");
        std::env::set_var("FIELDSYNC_API_BASE_URL", "https://field.example.com");
        std::env::set_var("FIELDSYNC_API_TIMEOUT", "10");
        std::env::set_var("FIELDSYNC_API_USER_AGENT", "fieldsync/1.0");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config loads from env");
        assert_eq!(config.store.path, "/tmp/queue.json");
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.pool_size, 2);
        assert_eq!(config.replay.max_attempts, 5);
        assert_eq!(config.replay.flush_interval_seconds, 15);
        assert_eq!(config.replay.flush_timeout_seconds, 60);
        assert!(!config.replay.enabled);
        assert_eq!(config.api.base_url.as_deref(), Some("https://field.example.com"));
        assert_eq!(config.api.request_timeout_seconds, 10);
        assert_eq!(config.api.user_agent.as_deref(), Some("fieldsync/1.0"));
    }

    #[test]
    fn test_load_from_env_defaults_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FIELDSYNC_STORE_PATH", "/tmp/queue.db");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config loads from env");
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.replay.max_attempts, 8);
        assert!(config.replay.enabled);
    }

    #[test]
    fn test_load_from_env_missing_store_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(FieldSyncError::Config(_))));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FIELDSYNC_STORE_PATH", "/tmp/queue.db");
        std::env::set_var("FIELDSYNC_REPLAY_MAX_ATTEMPTS", "eight");

        let result = load_from_env();
        clear_env();

        let err = result.unwrap_err();
        assert!(matches!(&err, FieldSyncError::Config(msg) if msg.contains("FIELDSYNC_REPLAY_MAX_ATTEMPTS")));
    }

    #[test]
    fn test_load_from_env_rejects_zero_ceiling() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FIELDSYNC_STORE_PATH", "/tmp/queue.db");
        std::env::set_var("FIELDSYNC_REPLAY_MAX_ATTEMPTS", "0");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(FieldSyncError::Config(_))));
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "fieldsync.json",
            r#"{
                "store": {"backend": "file", "path": "queue.json"},
                "replay": {"max_attempts": 4, "flush_interval_seconds": 12}
            }"#,
        );

        let config = load_from_file(Some(path)).expect("config loads from JSON");
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path, "queue.json");
        assert_eq!(config.replay.max_attempts, 4);
        assert_eq!(config.replay.flush_interval_seconds, 12);
        assert_eq!(config.api.request_timeout_seconds, 30);
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "fieldsync.toml",
            r#"
[store]
path = "queue.db"
pool_size = 6

[replay]
enabled = false

[api]
base_url = "https://field.example.com"
"#,
        );

        let config = load_from_file(Some(path)).expect("config loads from TOML");
        assert_eq!(config.store.pool_size, 6);
        assert!(!config.replay.enabled);
        assert_eq!(config.api.base_url.as_deref(), Some("https://field.example.com"));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/fieldsync.json")));
        assert!(matches!(result, Err(FieldSyncError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", r#"{ "store": "#);

        assert!(load_from_file(Some(path)).is_err());
    }

    #[test]
    fn test_load_from_file_runs_validation() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", r#"{"store": {"pool_size": 0}}"#);

        assert!(matches!(load_from_file(Some(path)), Err(FieldSyncError::Config(_))));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("store: {}", Path::new("fieldsync.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
