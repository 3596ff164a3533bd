use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so it
/// can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("RACKDB_ENV", "development"));
    let log_level = or_default("RACKDB_LOG_LEVEL", "info");
    let ledger_path = PathBuf::from(or_default("RACKDB_LEDGER_PATH", "./rackdb_ledger.sqlite3"));

    let db_max_connections = parse_u32("RACKDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RACKDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RACKDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("RACKDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "RACKDB_SCRAPER_USER_AGENT",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    );
    let scraper_inter_request_delay_ms = parse_u64("RACKDB_SCRAPER_INTER_REQUEST_DELAY_MS", "250")?;
    let scraper_max_retries = parse_u32("RACKDB_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("RACKDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        ledger_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_inter_request_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
    })
}

/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let map = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(var)) if var == "DATABASE_URL"));
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let map = HashMap::from([("DATABASE_URL", "postgres://localhost/rackdb")]);
        let config = build_app_config(lookup_from_map(&map)).unwrap();

        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_min_connections, 1);
        assert_eq!(config.scraper_max_retries, 3);
        assert_eq!(
            config.ledger_path.to_str().unwrap(),
            "./rackdb_ledger.sqlite3"
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let map = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/rackdb"),
            ("RACKDB_ENV", "production"),
            ("RACKDB_DB_MAX_CONNECTIONS", "42"),
            ("RACKDB_SCRAPER_REQUEST_TIMEOUT_SECS", "5"),
        ]);
        let config = build_app_config(lookup_from_map(&map)).unwrap();

        assert_eq!(config.env, Environment::Production);
        assert_eq!(config.db_max_connections, 42);
        assert_eq!(config.scraper_request_timeout_secs, 5);
    }

    #[test]
    fn invalid_numeric_override_is_an_error() {
        let map = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/rackdb"),
            ("RACKDB_DB_MAX_CONNECTIONS", "not-a-number"),
        ]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { var, .. }) if var == "RACKDB_DB_MAX_CONNECTIONS")
        );
    }

    #[test]
    fn unknown_environment_falls_back_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
        assert_eq!(parse_environment("test"), Environment::Test);
    }
}
