use std::{env, fmt, net::SocketAddr};

use chrono::Duration;
use discovery::credentials::Credentials;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "./resources/www/";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing environment variable {}", name),
            Self::Invalid { name, value } => {
                write!(f, "invalid value '{}' for {}", value, name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Server settings, read from the environment.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_address: SocketAddr,
    pub static_dir: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub credentials: Credentials,
}

impl WebConfig {
    /// `JWT_SECRET` is required. `LOCALLENS_BIND_ADDRESS`,
    /// `LOCALLENS_STATIC_DIR`, `LOCALLENS_TOKEN_TTL_HOURS` and
    /// `LOCALLENS_PASSWORD_ITERATIONS` fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bind_address = parse_var("LOCALLENS_BIND_ADDRESS", DEFAULT_BIND_ADDRESS.to_owned())?;
        let static_dir =
            env::var("LOCALLENS_STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_owned());
        let ttl_hours: i64 = parse_var("LOCALLENS_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "LOCALLENS_TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }
        let credentials = match env::var("LOCALLENS_PASSWORD_ITERATIONS") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|iterations| *iterations > 0)
                .map(Credentials::with_iterations)
                .ok_or(ConfigError::Invalid {
                    name: "LOCALLENS_PASSWORD_ITERATIONS",
                    value,
                })?,
            Err(_) => Credentials::default(),
        };

        Ok(Self {
            bind_address,
            static_dir,
            jwt_secret,
            token_ttl: Duration::hours(ttl_hours),
            credentials,
        })
    }
}

fn parse_var<T, D>(name: &'static str, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    D: ToString,
{
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
