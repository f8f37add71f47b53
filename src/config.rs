use envconfig::Envconfig;
use humantime_serde::re::humantime;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::algorithms::RateLimitStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envconfig::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "0.0.0.0:5000")]
    pub bind_addr: SocketAddr,

    /// Requests admitted per window on the collection route
    #[envconfig(from = "RATE_LIMIT_REQUESTS", default = "2")]
    pub rate_limit_requests: u32,

    /// Rate limit window, e.g. `60s` or `1m`
    #[envconfig(from = "RATE_LIMIT_WINDOW", default = "60s")]
    pub rate_limit_window: humantime::Duration,

    #[envconfig(from = "RATE_LIMIT_STRATEGY", default = "sliding_window")]
    pub rate_limit_strategy: RateLimitStrategy,

    /// Key clients by forwarding headers instead of the peer address
    #[envconfig(from = "TRUST_PROXY_HEADERS", default = "false")]
    pub trust_proxy_headers: bool,

    /// Preload the demo catalogue on startup
    #[envconfig(from = "SEED_BOOKS", default = "true")]
    pub seed_books: bool,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            rate_limit_requests: 2,
            rate_limit_window: Duration::from_secs(60).into(),
            rate_limit_strategy: RateLimitStrategy::SlidingWindow,
            trust_proxy_headers: false,
            seed_books: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::init_from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn rate_limit_window(&self) -> Duration {
        *self.rate_limit_window
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_requests == 0 {
            return Err(ConfigError::Invalid(
                "RATE_LIMIT_REQUESTS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_window().is_zero() {
            return Err(ConfigError::Invalid(
                "RATE_LIMIT_WINDOW must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
