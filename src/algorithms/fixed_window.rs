//! Fixed window rate limiting algorithm
//!
//! Counts admissions per key in windows that open on the first request
//! after the previous window expired. Expired windows are swept at most
//! once per window length.

use super::{AlgorithmConfig, Decision, RateLimitAlgorithm};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

struct Windows {
    open: HashMap<String, Window>,
    last_sweep: Instant,
}

pub struct FixedWindowLimiter {
    config: AlgorithmConfig,
    windows: Mutex<Windows>,
}

impl FixedWindowLimiter {
    pub fn new(config: AlgorithmConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(Windows {
                open: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    fn sweep(&self, windows: &mut Windows, now: Instant) -> usize {
        let length = self.config.window;
        let before = windows.open.len();
        windows
            .open
            .retain(|_, window| now.saturating_duration_since(window.started) < length);
        windows.last_sweep = now;
        before - windows.open.len()
    }
}

impl RateLimitAlgorithm for FixedWindowLimiter {
    fn check(&self, key: &str, now: Instant) -> Decision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(windows.last_sweep) >= self.config.window {
            self.sweep(&mut windows, now);
        }
        let window = windows.open.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        if window.count < self.config.requests {
            window.count += 1;
            Decision::allowed(self.config.requests - window.count)
        } else {
            Decision::denied(
                self.config
                    .window
                    .saturating_sub(now.saturating_duration_since(window.started)),
            )
        }
    }

    fn reset(&self, key: &str) {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.open.remove(key);
    }

    fn cleanup(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        self.sweep(&mut windows, now)
    }

    fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .open
            .len()
    }
}
