// ⚙️ Configuration
// All settings come from the process environment and are validated once at startup.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_TIPS_URL: &str = "TIPS_URL";
pub const ENV_TIMEOUT_SECS: &str = "TIPS_TIMEOUT_SECS";
pub const ENV_HOST: &str = "TIPS_SERVER_HOST";
pub const ENV_PORT: &str = "TIPS_SERVER_PORT";
pub const ENV_LOG_LEVEL: &str = "TIPS_LOG_LEVEL";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid TIPS URL {0:?}: must be an absolute http(s) URL")]
    InvalidUrl(String),

    #[error("Invalid timeout {0:?}: must be a positive number of seconds")]
    InvalidTimeout(String),

    #[error("Invalid port {0:?}: must be between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid log level {0:?}: must be one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TipsConfig {
    /// Upstream endpoint; `BRT-NO` is appended as a query parameter
    pub tips_url: String,
    pub timeout: Duration,
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
}

impl TipsConfig {
    /// Config pointing at `tips_url` with defaults for everything else
    pub fn new(tips_url: impl Into<String>) -> Self {
        TipsConfig {
            tips_url: tips_url.into(),
            timeout: Duration::from_secs(30),
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: LogLevel::Info,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tips_url = lookup(ENV_TIPS_URL)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_TIPS_URL))?;
        let mut config = TipsConfig::new(tips_url.trim());

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(raw));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }

        if let Some(raw) = lookup(ENV_PORT) {
            config.port = match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            };
        }

        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            config.log_level = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.tips_url.as_str();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| ConfigError::InvalidUrl(url.to_string()))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(format!("{:?}", self.timeout)));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
