//! S3O gate configuration.
//!
//! Configuration is loaded from environment variables. Nothing here is
//! secret: the authority's key is public and the gate holds no credentials.

use crate::auth::{DEFAULT_PUBLIC_KEY_URL, DEFAULT_REFRESH_PERIOD_SECONDS};
use crate::cookies::DEFAULT_COOKIE_MAX_AGE_SECONDS;
use crate::redirect::DEFAULT_AUTHENTICATE_URL;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// S3O gate configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// URL of the authority's public key endpoint.
    pub public_key_url: Url,

    /// URL of the authority's authenticate endpoint.
    pub authenticate_url: Url,

    /// Initial key refresh period in seconds (default: 300).
    pub key_refresh_seconds: u64,

    /// Lifetime of issued session cookies in seconds (default: 900000).
    pub cookie_max_age_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL configuration: {0}")]
    InvalidUrl(String),

    #[error("Invalid key refresh period configuration: {0}")]
    InvalidKeyRefreshPeriod(String),

    #[error("Invalid cookie max age configuration: {0}")]
    InvalidCookieMaxAge(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let public_key_url = parse_url(vars, "S3O_PUBLIC_KEY_URL", DEFAULT_PUBLIC_KEY_URL)?;
        let authenticate_url = parse_url(vars, "S3O_AUTHENTICATE_URL", DEFAULT_AUTHENTICATE_URL)?;

        let key_refresh_seconds = parse_positive_seconds(
            vars,
            "S3O_KEY_REFRESH_SECONDS",
            DEFAULT_REFRESH_PERIOD_SECONDS,
        )
        .map_err(ConfigError::InvalidKeyRefreshPeriod)?;

        let cookie_max_age_seconds = parse_positive_seconds(
            vars,
            "S3O_COOKIE_MAX_AGE_SECONDS",
            DEFAULT_COOKIE_MAX_AGE_SECONDS,
        )
        .map_err(ConfigError::InvalidCookieMaxAge)?;

        Ok(Config {
            bind_address,
            public_key_url,
            authenticate_url,
            key_refresh_seconds,
            cookie_max_age_seconds,
        })
    }

    /// Initial key refresh period.
    pub fn key_refresh_period(&self) -> Duration {
        Duration::from_secs(self.key_refresh_seconds)
    }

    /// Session cookie lifetime.
    pub fn cookie_max_age(&self) -> Duration {
        Duration::from_secs(self.cookie_max_age_seconds)
    }
}

fn parse_url(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<Url, ConfigError> {
    let value = vars.get(name).map(String::as_str).unwrap_or(default);
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidUrl(format!("{name} must be an absolute URL, got '{value}': {e}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{name} must use http or https, got '{value}'"
        )));
    }
    Ok(url)
}

fn parse_positive_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, String> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        format!("{name} must be a valid positive integer, got '{value_str}': {e}")
    })?;

    if value == 0 {
        return Err(format!("{name} must be greater than 0"));
    }
    Ok(value)
}
