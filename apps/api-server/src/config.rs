//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.eq_ignore_ascii_case("memory") {
            Ok(Self::Memory)
        } else if s.eq_ignore_ascii_case("sqlite") {
            Ok(Self::Sqlite)
        } else {
            Err(ConfigError {
                field: "STORAGE_PROVIDER",
                message: format!("Unknown provider '{}', expected memory or sqlite", s),
            })
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn truthy(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3001)
    pub port: u16,
    /// CORS allow origin
    pub cors_allow_origin: HeaderValue,
    /// Storage provider (default: memory)
    pub storage_provider: StorageProvider,
    /// SQLite database path (default: ./data/items.db)
    pub db_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
    /// Insert the sample items at startup
    pub seed_data: bool,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Port
        let port = match get("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError {
                field: "PORT",
                message: format!("Invalid port '{}'", s),
            })?,
            None => 3001,
        };

        // CORS allow origin
        let cors_origin_str = get("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".into());
        let cors_allow_origin = if cors_origin_str == "*" {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(&cors_origin_str).map_err(|e| ConfigError {
                field: "CORS_ALLOW_ORIGIN",
                message: format!("Invalid header value '{}': {}", cors_origin_str, e),
            })?
        };

        // Storage provider
        let storage_provider =
            StorageProvider::parse(&get("STORAGE_PROVIDER").unwrap_or_else(|| "memory".into()))?;

        // DB path (for sqlite)
        let db_path = get("DB_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/items.db"));

        // Log format
        let log_format =
            LogFormat::from_str(&get("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        let seed_data = get("SEED_DATA").map(|s| truthy(&s)).unwrap_or(false);

        Ok(Self {
            port,
            cors_allow_origin,
            storage_provider,
            db_path,
            log_format,
            seed_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.storage_provider, StorageProvider::Memory);
        assert_eq!(cfg.db_path, PathBuf::from("./data/items.db"));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.cors_allow_origin, HeaderValue::from_static("*"));
        assert!(!cfg.seed_data);
    }

    #[test]
    fn storage_provider_parsing() {
        assert_eq!(StorageProvider::parse("memory").unwrap(), StorageProvider::Memory);
        assert_eq!(StorageProvider::parse("sqlite").unwrap(), StorageProvider::Sqlite);
        assert_eq!(StorageProvider::parse("SQLITE").unwrap(), StorageProvider::Sqlite);
        let err = StorageProvider::parse("postgres").unwrap_err();
        assert_eq!(err.field, "STORAGE_PROVIDER");
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("anything"), LogFormat::Pretty);
    }

    #[test]
    fn explicit_values() {
        let cfg = load(&[
            ("PORT", "8080"),
            ("STORAGE_PROVIDER", "sqlite"),
            ("DB_PATH", "/tmp/x.db"),
            ("SEED_DATA", "yes"),
            ("CORS_ALLOW_ORIGIN", "https://admin.example.com"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.storage_provider, StorageProvider::Sqlite);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x.db"));
        assert!(cfg.seed_data);
        assert_eq!(cfg.cors_allow_origin, "https://admin.example.com");
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert_eq!(load(&[("PORT", "http")]).unwrap_err().field, "PORT");
        assert_eq!(
            load(&[("CORS_ALLOW_ORIGIN", "bad\nvalue")]).unwrap_err().field,
            "CORS_ALLOW_ORIGIN"
        );
    }
}
