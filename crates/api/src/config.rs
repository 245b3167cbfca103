use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Read `var`, falling back to `default` when unset.
pub(crate) fn env_or<T>(var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value,
        reason: e.to_string(),
    })
}

/// Read a variable that must be present and non-empty.
pub(crate) fn env_required(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn env_optional(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Which storage backend the process runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

/// Settings for the external layout generator.
///
/// When either the URL or the key is missing the server runs with the
/// offline generator, and every generation falls back to a placeholder.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl GeneratorConfig {
    /// | Env Var                  | Default        |
    /// |--------------------------|----------------|
    /// | `GENERATOR_API_URL`      | --             |
    /// | `GENERATOR_API_KEY`      | --             |
    /// | `GENERATOR_MODEL`        | `gpt-4o-mini`  |
    /// | `GENERATOR_TIMEOUT_SECS` | `60`           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: env_optional("GENERATOR_API_URL"),
            api_key: env_optional("GENERATOR_API_KEY"),
            model: env_or("GENERATOR_MODEL", "gpt-4o-mini")?,
            timeout_secs: env_or("GENERATOR_TIMEOUT_SECS", "60")?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret (and the database URL when running on
/// PostgreSQL) have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
    pub jwt: JwtConfig,
    pub generator: GeneratorConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `STORAGE_BACKEND`      | `postgres`                 |
    /// | `DATABASE_URL`         | required for `postgres`    |
    /// | `DB_MAX_CONNECTIONS`   | `20`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0")?;
        let port = env_or("PORT", "3000")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", "30")?;

        let backend: String = env_or("STORAGE_BACKEND", "postgres")?;
        let storage = match backend.to_ascii_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: env_required("DATABASE_URL")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", "20")?,
            },
            "memory" => StorageBackend::Memory,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "STORAGE_BACKEND",
                    value: backend,
                    reason: "expected 'postgres' or 'memory'".to_string(),
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage,
            jwt: JwtConfig::from_env()?,
            generator: GeneratorConfig::from_env()?,
        })
    }
}
