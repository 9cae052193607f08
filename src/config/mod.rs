//! Configuration Module
//!
//! Centralized configuration management for the directory service. The
//! configuration is read once from the environment at start-up and shared
//! immutably afterwards.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::database::DatabaseConfig;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Environment variable helpers
pub mod env {
    use std::env;

    use super::ConfigError;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as usize with default
    pub fn get_usize(key: &str, default: usize) -> usize {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,

    /// Outbound mail; `None` disables password-reset mail delivery
    pub email: Option<EmailConfig>,

    pub geocoder: GeocoderConfig,
    pub upload: UploadConfig,

    /// Bound on every geocoder and mail call
    pub upstream_timeout: Duration,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `development` or `production`
    pub environment: String,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub max_request_size: usize,
    /// `{scheme}://{host}` clients reach the API on; used in mailed links
    pub public_url: String,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Session token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_hours: i64,
    /// Lifetime of the `token` cookie in days
    pub cookie_expire_days: i64,
}

/// Password and reset-token settings plus response headers
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
    pub reset_token_expires_minutes: i64,
    pub headers: SecurityHeadersConfig,
}

/// Security headers configuration
#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    pub csp_directive: String,
    pub hsts_enabled: bool,
    pub hsts_max_age: u32,
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_use_tls: bool,
    pub from_name: String,
    pub from_email: String,
}

/// Geocoding provider configuration
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Photo upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub path: PathBuf,
    pub max_file_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let port = env::get_u16("SERVER_PORT", 5000);
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port,
            environment: env::get_string("APP_ENV", "development"),
            log_level: env::get_string("LOG_LEVEL", "info"),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_request_size: env::get_usize("MAX_REQUEST_SIZE", 1024 * 1024), // 1MB
            public_url: env::get_string(
                "PUBLIC_BASE_URL",
                &format!("http://localhost:{}", port),
            ),
        }
    }
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            csp_directive: "default-src 'self'".to_string(),
            hsts_enabled: true,
            hsts_max_age: 31536000, // 1 year
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: env::get_u32("BCRYPT_COST", 10),
            reset_token_expires_minutes: env::get_i64("RESET_TOKEN_EXPIRE_MINUTES", 10),
            headers: SecurityHeadersConfig {
                hsts_enabled: env::get_bool("HSTS_ENABLED", true),
                ..SecurityHeadersConfig::default()
            },
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(env::get_string("FILE_UPLOAD_PATH", "./public/uploads")),
            max_file_size: env::get_usize("MAX_FILE_UPLOAD", 1_000_000),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::get_required("JWT_SECRET")?,
            expires_hours: env::get_i64("JWT_EXPIRE_HOURS", 24 * 30),
            cookie_expire_days: env::get_i64("JWT_COOKIE_EXPIRE", 30),
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        if !env::is_set("SMTP_HOST") {
            return Ok(None);
        }

        Ok(Some(Self {
            smtp_host: env::get_required("SMTP_HOST")?,
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_username: env::get_required("SMTP_USERNAME")?,
            smtp_password: env::get_required("SMTP_PASSWORD")?,
            smtp_use_tls: env::get_bool("SMTP_USE_TLS", true),
            from_name: env::get_string("SMTP_FROM_NAME", "Restaurant Directory"),
            from_email: env::get_required("SMTP_FROM_EMAIL")?,
        }))
    }
}

impl GeocoderConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::get_string(
                "GEOCODER_BASE_URL",
                "https://www.mapquestapi.com/geocoding/v1/address",
            ),
            api_key: env::get_string("GEOCODER_API_KEY", ""),
        }
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = DatabaseConfig::from_env()
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        Ok(Self {
            server: ServerConfig::default(),
            database,
            jwt: JwtConfig::from_env()?,
            security: SecurityConfig::default(),
            email: EmailConfig::from_env()?,
            geocoder: GeocoderConfig::from_env(),
            upload: UploadConfig::default(),
            upstream_timeout: Duration::from_secs(env::get_u64("UPSTREAM_TIMEOUT_SECONDS", 10)),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.server.environment.as_str(), "development" | "production" | "test") {
            return Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: self.server.environment.clone(),
                reason: "Must be 'development', 'production' or 'test'".to_string(),
            });
        }

        let public_url = reqwest::Url::parse(&self.server.public_url).map_err(|e| {
            ConfigError::InvalidValue {
                key: "PUBLIC_BASE_URL".to_string(),
                value: self.server.public_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(public_url.scheme(), "http" | "https")
            || !public_url.has_host()
            || public_url.path() != "/"
        {
            return Err(ConfigError::InvalidValue {
                key: "PUBLIC_BASE_URL".to_string(),
                value: self.server.public_url.clone(),
                reason: "Must be an http(s) origin such as https://api.example.com".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::ValidationError(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }

        if self.jwt.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT secret cannot be empty".to_string(),
            ));
        }

        if self.jwt.expires_hours <= 0 || self.jwt.cookie_expire_days <= 0 {
            return Err(ConfigError::ValidationError(
                "JWT and cookie lifetimes must be positive".to_string(),
            ));
        }

        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST".to_string(),
                value: self.security.bcrypt_cost.to_string(),
                reason: "Must be between 4 and 31".to_string(),
            });
        }

        if self.security.reset_token_expires_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "Reset token lifetime must be positive".to_string(),
            ));
        }

        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_FILE_UPLOAD must be greater than 0".to_string(),
            ));
        }

        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
