/// Configuration management for Post Service
///
/// Everything is read from environment variables (optionally seeded from a
/// `.env` file by the binary).
use crate::models::FEED_WINDOW;
use db_pool::env_utils::{parse_env_strict, parse_env_with_default};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Storage backend selection and database settings
    pub database: DatabaseConfig,
    /// Feed and ingestion limits
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// HTTP worker count
    pub workers: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Where posts and credentials live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Feed window and post limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum posts returned by any feed query
    pub window: usize,
    /// Maximum post length in characters
    pub max_body_chars: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if is_production => {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
            }
            Err(_) => "http://localhost:3000".to_string(),
        };
        if is_production && allowed_origins.trim() == "*" {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }

        let backend: StoreBackend = parse_env_strict("POST_STORE_BACKEND", StoreBackend::Postgres)?;
        if is_production && backend == StoreBackend::Memory {
            return Err("POST_STORE_BACKEND=memory is not allowed in production".to_string());
        }

        let window: usize = parse_env_strict("FEED_WINDOW", FEED_WINDOW)?;
        if window == 0 {
            return Err("FEED_WINDOW must be at least 1".to_string());
        }

        let max_body_chars: usize = parse_env_strict("POST_MAX_BODY_CHARS", 1_000)?;
        if max_body_chars == 0 {
            return Err("POST_MAX_BODY_CHARS must be at least 1".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_strict("POST_SERVICE_PORT", 8080)?,
                workers: parse_env_with_default("POST_SERVICE_WORKERS", 4),
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig {
                backend,
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/gobbler".to_string()),
                max_connections: parse_env_with_default("DATABASE_MAX_CONNECTIONS", 10),
            },
            feed: FeedConfig {
                window,
                max_body_chars,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
