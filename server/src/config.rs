//! Server configuration parsed from environment variables.
//!
//! `main` loads an optional `.env` file first, so every value below can also
//! come from there. Numeric values that fail to parse fall back to their
//! defaults; only `DATABASE_URL` is mandatory.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub upload_max_bytes: usize,
    /// Allowed CORS origins; empty means any origin.
    pub cors_origins: Vec<String>,
    /// Recorded on every upload in `upload_history.schema_version`.
    pub schema_version: String,
}

impl ServerConfig {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `UPLOAD_MAX_BYTES`: default 10 MiB
    /// - `CORS_ORIGINS`: comma-separated origins, default any
    /// - `UPLOAD_SCHEMA_VERSION`: default `v1`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` is absent or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            upload_max_bytes: parse_or(&lookup, "UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            schema_version: lookup("UPLOAD_SCHEMA_VERSION")
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SCHEMA_VERSION.to_owned()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
