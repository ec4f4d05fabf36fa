//! TOML-based configuration for devbook
//!
//! Settings come from a TOML file (`devbook.toml` by default). The signing
//! secret is never written to the file: `auth.jwt_secret_env` names the
//! environment variable that holds it.
//!
//! Configuration is read once at startup. Nothing here is reloaded while the
//! server runs.

use crate::auth::jwt::SigningSecret;
use crate::auth::password::PasswordHasher;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound for `auth.token_ttl_secs`: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Root configuration structure loaded from devbook.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT signing secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Lifetime of every issued token, in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    /// Argon2 cost; the argon2 crate defaults apply when omitted
    #[serde(default)]
    pub password: Option<PasswordConfig>,
}

fn default_jwt_secret_env() -> String {
    "SECRET_KEY".to_string()
}

fn default_token_ttl_secs() -> i64 {
    21600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_secs: default_token_ttl_secs(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "./data/devbook.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Signing secret must not be empty")]
    EmptySecret,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    ///
    /// Validation includes resolving the signing secret, so a successful
    /// load guarantees the server can start.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Parse TOML without validating it.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check value ranges and that the signing secret is available.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }

        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must be positive, got {}",
                self.auth.token_ttl_secs
            )));
        }
        self.token_ttl()?;

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }

        self.password_hasher()?;
        self.signing_secret()?;

        Ok(())
    }

    /// Resolve the signing secret from the configured environment variable.
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        let secret = std::env::var(&self.auth.jwt_secret_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))?;
        SigningSecret::new(secret)
    }

    /// Token lifetime, bounded by [`MAX_TOKEN_TTL_SECS`].
    pub fn token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        let secs = self.auth.token_ttl_secs;
        if secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must be at most {}, got {}",
                MAX_TOKEN_TTL_SECS, secs
            )));
        }
        chrono::Duration::try_seconds(secs).ok_or_else(|| {
            ConfigError::ValidationError(format!("auth.token_ttl_secs out of range: {}", secs))
        })
    }

    /// Hasher built from `[auth.password]`, or the argon2 defaults.
    pub fn password_hasher(&self) -> Result<PasswordHasher, ConfigError> {
        match self.auth.password {
            Some(cost) => {
                PasswordHasher::from_cost(cost.memory_kib, cost.iterations, cost.parallelism)
                    .map_err(|e| ConfigError::ValidationError(e.to_string()))
            }
            None => Ok(PasswordHasher::default()),
        }
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
