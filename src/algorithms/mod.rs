//! Rate limiting algorithms
//!
//! Each algorithm keeps its own per-key state in memory and answers one
//! question per request: admit or reject. The [`crate::rate_limiter::RateLimiter`]
//! picks an implementation from [`RateLimitStrategy`] at startup.

pub mod fixed_window;
pub mod sliding_window;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

pub use fixed_window::FixedWindowLimiter;
pub use sliding_window::SlidingWindowLimiter;

/// Quota applied by an algorithm: `requests` admissions per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub requests: u32,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            requests: 2,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the next admission becomes possible; zero when allowed.
    pub retry_after: Duration,
}

impl Decision {
    pub fn allowed(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: Duration::ZERO,
        }
    }

    pub fn denied(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            retry_after,
        }
    }
}

/// Trait for rate limiting algorithms
pub trait RateLimitAlgorithm: Send + Sync {
    /// Record an attempt for `key` at `now` and decide whether it is admitted
    fn check(&self, key: &str, now: Instant) -> Decision;

    /// Forget all state held for `key`
    fn reset(&self, key: &str);

    /// Drop keys with nothing left inside the window; returns how many went
    fn cleanup(&self, now: Instant) -> usize;

    /// Number of keys currently tracked
    fn tracked_keys(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    SlidingWindow,
    FixedWindow,
}

impl RateLimitStrategy {
    pub fn build(self, config: AlgorithmConfig) -> Box<dyn RateLimitAlgorithm> {
        match self {
            RateLimitStrategy::SlidingWindow => Box::new(SlidingWindowLimiter::new(config)),
            RateLimitStrategy::FixedWindow => Box::new(FixedWindowLimiter::new(config)),
        }
    }
}

impl fmt::Display for RateLimitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitStrategy::SlidingWindow => write!(f, "sliding_window"),
            RateLimitStrategy::FixedWindow => write!(f, "fixed_window"),
        }
    }
}

impl FromStr for RateLimitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sliding_window" | "sliding" => Ok(RateLimitStrategy::SlidingWindow),
            "fixed_window" | "fixed" => Ok(RateLimitStrategy::FixedWindow),
            other => Err(format!(
                "unknown rate limit strategy '{}', expected sliding_window or fixed_window",
                other
            )),
        }
    }
}
