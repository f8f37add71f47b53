//! Sliding window rate limiting algorithm
//!
//! Keeps a log of admission instants per key. An attempt is admitted when
//! fewer than `requests` admissions fall inside the trailing window, so no
//! span of `window` length ever holds more than `requests` admissions.
//! Keys whose whole log has expired are swept at most once per window.

use super::{AlgorithmConfig, Decision, RateLimitAlgorithm};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

struct Logs {
    entries: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

pub struct SlidingWindowLimiter {
    config: AlgorithmConfig,
    logs: Mutex<Logs>,
}

impl SlidingWindowLimiter {
    pub fn new(config: AlgorithmConfig) -> Self {
        Self {
            config,
            logs: Mutex::new(Logs {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    fn sweep(&self, logs: &mut Logs, now: Instant) -> usize {
        let window = self.config.window;
        let before = logs.entries.len();
        logs.entries.retain(|_, log| {
            log.back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < window)
        });
        logs.last_sweep = now;
        before - logs.entries.len()
    }
}

impl RateLimitAlgorithm for SlidingWindowLimiter {
    fn check(&self, key: &str, now: Instant) -> Decision {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(logs.last_sweep) >= self.config.window {
            self.sweep(&mut logs, now);
        }
        let log = logs.entries.entry(key.to_string()).or_default();

        // Remove expired admissions
        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= self.config.window {
                log.pop_front();
            } else {
                break;
            }
        }

        if log.len() < self.config.requests as usize {
            log.push_back(now);
            return Decision::allowed(self.config.requests - log.len() as u32);
        }

        let retry_after = log
            .front()
            .map(|&oldest| self.config.window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(self.config.window);

        Decision::denied(retry_after)
    }

    fn reset(&self, key: &str) {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        logs.entries.remove(key);
    }

    fn cleanup(&self, now: Instant) -> usize {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        self.sweep(&mut logs, now)
    }

    fn tracked_keys(&self) -> usize {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
