//! Blog configuration management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development. There is no default signing
//! secret; `validate` rejects a configuration without one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Token signing and password hashing
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// `JWT_SECRET` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = parse_var("PORT", port)?;
        }
        if let Ok(timeout) = std::env::var("REQUEST_TIMEOUT_SECS") {
            config.server.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", timeout)?;
        }

        // CORS origins from environment variable (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = Some(url);
        }

        // Auth
        config.auth.jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingRequired("JWT_SECRET".to_string()))?;
        if let Ok(secs) = std::env::var("JWT_EXPIRATION_SECS") {
            config.auth.jwt_expiration_secs = parse_var("JWT_EXPIRATION_SECS", secs)?;
        }
        if let Ok(memory) = std::env::var("PASSWORD_MEMORY_KIB") {
            config.auth.password_memory_kib = parse_var("PASSWORD_MEMORY_KIB", memory)?;
        }
        if let Ok(time_cost) = std::env::var("PASSWORD_TIME_COST") {
            config.auth.password_time_cost = parse_var("PASSWORD_TIME_COST", time_cost)?;
        }
        if let Ok(parallelism) = std::env::var("PASSWORD_PARALLELISM") {
            config.auth.password_parallelism = parse_var("PASSWORD_PARALLELISM", parallelism)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = parse_var("LOG_JSON", json)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.auth.jwt_expiration_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRATION_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub url: Option<String>,

    /// Connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
        }
    }
}

/// Token and credential settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret shared by every request worker
    pub jwt_secret: String,

    /// Access token lifetime in seconds (default: 24 hours)
    pub jwt_expiration_secs: u64,

    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,

    /// Argon2 iterations
    pub password_time_cost: u32,

    /// Argon2 lanes
    pub password_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiration_secs: 24 * 60 * 60,
            password_memory_kib: 19 * 1024,
            password_time_cost: 2,
            password_parallelism: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
