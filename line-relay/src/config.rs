//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup and passed into the handlers.
//! Nothing reads the environment mid-request.

use std::env;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default LINE Messaging API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.line.me";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Channel secret used to verify `x-line-signature`
    pub channel_secret: String,

    /// Channel access token used for reply and push calls
    pub channel_token: String,

    /// Default push recipient; `None` disables pushing
    pub user_id: Option<String>,

    /// Port for the web server to listen on (required)
    pub port: u16,

    /// Base URL of the Messaging API
    pub api_base_url: Url,

    /// HTTP request timeout in milliseconds for outbound calls
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let channel_secret = required(&lookup, "CHANNEL_SECRET")?;
        let channel_token = required(&lookup, "CHANNEL_TOKEN")?;

        // Stored verbatim; whitespace only decides whether it is set
        let user_id = lookup("USER_ID").filter(|v| !v.trim().is_empty());

        let raw_port = required(&lookup, "PORT")?;
        let port = raw_port.trim().parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: raw_port.clone(),
        })?;

        let api_base_url = match lookup("LINE_API_BASE_URL") {
            Some(raw) => Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid {
                name: "LINE_API_BASE_URL",
                value: raw,
            })?,
            None => Url::parse(DEFAULT_API_BASE_URL).map_err(|_| ConfigError::Invalid {
                name: "LINE_API_BASE_URL",
                value: DEFAULT_API_BASE_URL.to_string(),
            })?,
        };

        let request_timeout_ms = match lookup("REQUEST_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse() {
                Ok(ms) => ms,
                Err(_) => {
                    warn!(env_var = "REQUEST_TIMEOUT_MS", value = %raw, "Invalid timeout, using default");
                    10_000
                }
            },
            None => 10_000,
        };

        Ok(Config {
            channel_secret,
            channel_token,
            user_id,
            port,
            api_base_url,
            request_timeout_ms,
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}
