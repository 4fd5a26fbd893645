//! Runtime configuration read from `MINIONS_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use minions_observability::LogFormat;
use thiserror::Error;

pub const BIND_ADDR: &str = "MINIONS_BIND_ADDR";
pub const TEMPLATE_DIR: &str = "MINIONS_TEMPLATE_DIR";
pub const TEMPLATE_RELOAD: &str = "MINIONS_TEMPLATE_RELOAD";
pub const STATIC_DIR: &str = "MINIONS_STATIC_DIR";
pub const STATIC_PREFIX: &str = "MINIONS_STATIC_PREFIX";
pub const LOG_FORMAT: &str = "MINIONS_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: expected a socket address, got '{value}'")]
    InvalidAddr { key: &'static str, value: String },

    #[error("{key}: expected true/false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error("{key}: expected json or pretty, got '{value}'")]
    InvalidLogFormat { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,
    pub template_dir: PathBuf,
    /// Re-read templates before every render (development only).
    pub template_reload: bool,
    pub static_dir: PathBuf,
    pub static_prefix: String,
    pub log_format: LogFormat,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            template_dir: PathBuf::from("templates"),
            template_reload: false,
            static_dir: PathBuf::from("static"),
            static_prefix: "/static".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl HttpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(BIND_ADDR) {
            config.bind_addr = value.trim().parse().map_err(|_| ConfigError::InvalidAddr {
                key: BIND_ADDR,
                value,
            })?;
        }
        if let Some(value) = lookup(TEMPLATE_DIR) {
            config.template_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(TEMPLATE_RELOAD) {
            config.template_reload = parse_bool(TEMPLATE_RELOAD, value)?;
        }
        if let Some(value) = lookup(STATIC_DIR) {
            config.static_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(STATIC_PREFIX) {
            config.static_prefix = value;
        }
        if let Some(value) = lookup(LOG_FORMAT) {
            config.log_format =
                LogFormat::parse(&value).ok_or(ConfigError::InvalidLogFormat { key: LOG_FORMAT, value })?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}
