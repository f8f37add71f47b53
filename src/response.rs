use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;

use crate::algorithms::RateLimitStrategy;

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Marks process start; later calls are no-ops.
pub fn mark_started() {
    LazyLock::force(&START_TIME);
}

#[derive(Debug, Serialize)]
pub struct RateLimitPolicy {
    pub requests: u32,
    #[serde(with = "humantime_serde")]
    pub window: std::time::Duration,
    pub strategy: RateLimitStrategy,
    pub tracked_clients: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub books: usize,
    pub rate_limit: RateLimitPolicy,
}

impl HealthResponse {
    pub fn healthy(books: usize, rate_limit: RateLimitPolicy) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: START_TIME.elapsed().as_secs(),
            books,
            rate_limit,
        }
    }
}
