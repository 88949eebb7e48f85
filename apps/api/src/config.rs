//! API configuration module.
//!
//! Configuration is loaded from environment variables (after `.env`, when
//! present) with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tillpoint_db::DbConfig;

const DEV_JWT_SECRET: &str = "tillpoint-dev-secret-change-in-production";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(&self) -> bool {
        matches!(self, AppEnv::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `APP_ENV`, development unless set to `production`
    pub app_env: AppEnv,

    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Allowed browser origin
    pub cors_origin: String,

    /// Upper bound on one sale request
    pub sale_timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = match env::var("APP_ENV").as_deref() {
            Ok("production") => AppEnv::Production,
            Ok("development") | Err(_) => AppEnv::Development,
            Ok(_) => return Err(ConfigError::InvalidValue("APP_ENV".to_string())),
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if app_env == AppEnv::Production => {
                return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()))
            }
            _ => DEV_JWT_SECRET.to_string(),
        };

        Ok(ApiConfig {
            app_env,
            http_port: parse_var("HTTP_PORT", 3001)?,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/tillpoint.db".to_string())
                .into(),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_access_lifetime_secs: parse_var("JWT_ACCESS_LIFETIME_SECS", 900)?, // 15 minutes
            jwt_refresh_lifetime_secs: parse_var("JWT_REFRESH_LIFETIME_SECS", 604_800)?, // 7 days
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            sale_timeout: Duration::from_secs(parse_var("SALE_TIMEOUT_SECS", 10)?),
        })
    }

    /// A development configuration on an in-memory database, for tests.
    pub fn for_tests() -> Self {
        ApiConfig {
            app_env: AppEnv::Development,
            http_port: 0,
            database_path: PathBuf::from(":memory:"),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 900,
            jwt_refresh_lifetime_secs: 604_800,
            cors_origin: "http://localhost:3000".to_string(),
            sale_timeout: Duration::from_secs(10),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        if self.database_path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
