use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("TASK_API_REQUIRE_AUTH is enabled but TASK_API_JWT_SECRET is not set")]
    MissingSigningKey,
}

/// Signing-key configuration handed to the token codec.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub require_auth: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("require_auth", &self.require_auth)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub auth: AuthConfig,
    /// Comma-separated CORS allow-list; empty means any origin.
    pub cors_origins: String,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            port: DEFAULT_PORT,
            auth: AuthConfig::default(),
            cors_origins: String::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("TASK_API_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        // Secrets managers sometimes hand values back wrapped in quotes
        let jwt_secret = lookup("TASK_API_JWT_SECRET")
            .map(|secret| secret.trim().trim_matches('"').to_string())
            .filter(|secret| !secret.is_empty());

        let require_auth = parse_bool(&lookup, "TASK_API_REQUIRE_AUTH", false)?;
        if require_auth && jwt_secret.is_none() {
            return Err(ConfigError::MissingSigningKey);
        }

        Ok(Self {
            database_url,
            max_connections: parse_number(&lookup, "TASK_API_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            port: parse_number(&lookup, "PORT", DEFAULT_PORT)?,
            auth: AuthConfig {
                jwt_secret,
                require_auth,
            },
            cors_origins: lookup("TASK_API_CORS_ORIGINS").unwrap_or_default(),
            request_timeout: Duration::from_secs(parse_number(
                &lookup,
                "TASK_API_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            shutdown_grace: Duration::from_secs(parse_number(
                &lookup,
                "TASK_API_SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE_SECS,
            )?),
        })
    }
}

fn parse_number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}
