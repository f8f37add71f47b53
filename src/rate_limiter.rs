use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::algorithms::{AlgorithmConfig, Decision, RateLimitAlgorithm, RateLimitStrategy};
use crate::config::Config;

/// Per-client quota shared by every route it guards.
///
/// Counters are keyed by `route|client`, so routes never share a bucket
/// unless they pass the same route name.
#[derive(Clone)]
pub struct RateLimiter {
    policy: AlgorithmConfig,
    strategy: RateLimitStrategy,
    algorithm: Arc<dyn RateLimitAlgorithm>,
}

impl RateLimiter {
    pub fn new(strategy: RateLimitStrategy, policy: AlgorithmConfig) -> Self {
        Self {
            policy,
            strategy,
            algorithm: Arc::from(strategy.build(policy)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_strategy,
            AlgorithmConfig {
                requests: config.rate_limit_requests,
                window: config.rate_limit_window(),
            },
        )
    }

    /// Decide whether `client_key` may call `route` now
    pub fn allow(&self, client_key: &str, route: &str) -> Decision {
        self.allow_at(client_key, route, Instant::now())
    }

    pub fn allow_at(&self, client_key: &str, route: &str, now: Instant) -> Decision {
        self.algorithm.check(&Self::bucket_key(client_key, route), now)
    }

    /// Reset the quota of one client on one route
    pub fn reset(&self, client_key: &str, route: &str) {
        self.algorithm.reset(&Self::bucket_key(client_key, route));
    }

    /// Drop clients whose quota has fully recovered
    pub fn cleanup_expired(&self) -> usize {
        self.algorithm.cleanup(Instant::now())
    }

    pub fn limit(&self) -> u32 {
        self.policy.requests
    }

    pub fn window(&self) -> Duration {
        self.policy.window
    }

    pub fn policy(&self) -> AlgorithmConfig {
        self.policy
    }

    pub fn strategy(&self) -> RateLimitStrategy {
        self.strategy
    }

    pub fn tracked_clients(&self) -> usize {
        self.algorithm.tracked_keys()
    }

    fn bucket_key(client_key: &str, route: &str) -> String {
        format!("{}|{}", route, client_key)
    }
}
