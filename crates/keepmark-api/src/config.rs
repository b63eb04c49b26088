//! Typed server configuration, read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/keepmark` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `STORAGE_BACKEND` | `postgres` (`memory` for a non-durable in-process store) |
//! | `JWT_SECRET` | required in production |
//! | `BCRYPT_COST` | `12` |
//! | `HOST` / `PORT` | `0.0.0.0` / `2600` |
//! | `APP_ENV` (or `NODE_ENV`) | `production` |
//! | `ALLOWED_ORIGINS` | unset: any origin |
//!
//! Logging variables are read separately by [`crate::logging::LoggingConfig`]
//! so the subscriber exists before anything here can warn.

use chrono::Duration;
use tracing::warn;

use keepmark_core::{Error, Result};
use keepmark_db::pool::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/keepmark";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 2600;

/// Bearer tokens stay valid for 30 days.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Cost factors bcrypt accepts.
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Signing secret used outside production when `JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "keepmark-development-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    /// Internal error details are echoed to clients only in development.
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::Config(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Token signing and password hashing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::days(TOKEN_TTL_DAYS),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Settings the router and listener need.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: Environment::default(),
            allowed_origins: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageBackend,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!("DB_MAX_CONNECTIONS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let storage = match var("STORAGE_BACKEND") {
            Some(raw) => StorageBackend::parse(&raw)?,
            None => StorageBackend::default(),
        };

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_development() => {
                warn!(
                    subsystem = "config",
                    "JWT_SECRET not set; using the development signing secret"
                );
                DEV_JWT_SECRET.to_string()
            }
            None => {
                return Err(Error::Config(
                    "JWT_SECRET must be set in production".to_string(),
                ))
            }
        };

        let bcrypt_cost = match var("BCRYPT_COST") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|c| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(c))
                .ok_or_else(|| {
                    Error::Config(format!(
                        "BCRYPT_COST must be between {} and {}, got '{}'",
                        MIN_BCRYPT_COST,
                        MAX_BCRYPT_COST,
                        raw
                    ))
                })?,
            None => bcrypt::DEFAULT_COST,
        };

        let allowed_origins = var("ALLOWED_ORIGINS").map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(Self {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
                environment,
                allowed_origins,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections,
            },
            storage,
            auth: AuthConfig::new(jwt_secret).with_bcrypt_cost(bcrypt_cost),
        })
    }
}
