//! # Shared Breaker Counters
//!
//! Failure/success tallies and the open-timeout timestamp shared by the
//! state variants of a single circuit breaker. One instance exists per
//! breaker; state variants hold it by `Arc` so history survives every
//! transition (the tallies are never copied).

use crate::config::CircuitBreakerConfig;
use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// Mutable tallies, guarded by a single reader/writer lock.
#[derive(Debug, Default)]
struct Tallies {
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

/// Concurrency-safe counters for one circuit breaker.
///
/// Thresholds and the timeout window are fixed at construction; only the
/// tallies mutate, always under the lock. Every operation is total and
/// cannot fail.
#[derive(Debug)]
pub struct Counters {
    tallies: RwLock<Tallies>,
    failure_threshold: u32,
    success_threshold: u32,
    timeout: Duration,
}

impl Counters {
    /// Create counters from a breaker configuration, with zeroed tallies.
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self {
            tallies: RwLock::new(Tallies::default()),
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            timeout: config.timeout,
        }
    }

    /// Increment the failure tally by 1.
    pub fn increment_failure(&self) {
        self.tallies.write().failure_count += 1;
    }

    /// Reset the failure tally back to 0.
    pub fn reset_failure(&self) {
        self.tallies.write().failure_count = 0;
    }

    /// Increment the success tally by 1.
    pub fn increment_success(&self) {
        self.tallies.write().success_count += 1;
    }

    /// Reset the success tally back to 0.
    pub fn reset_success(&self) {
        self.tallies.write().success_count = 0;
    }

    /// Record the start of the open-state cool-down window.
    pub fn start_timeout(&self) {
        self.tallies.write().opened_at = Some(Instant::now());
    }

    /// Check whether the cool-down window has elapsed.
    ///
    /// A breaker that never opened reports the window as expired, matching
    /// the zero-value timestamp semantics the state machine expects.
    pub fn is_timeout_expired(&self) -> bool {
        let opened_at = self.tallies.read().opened_at;
        match opened_at {
            Some(opened) => opened.elapsed() > self.timeout,
            None => true,
        }
    }

    /// Check whether the failure tally has exceeded its threshold.
    ///
    /// Strictly greater-than: threshold N trips on the (N+1)-th failure.
    pub fn is_failure_threshold_exceeded(&self) -> bool {
        self.tallies.read().failure_count > self.failure_threshold
    }

    /// Check whether the success tally has exceeded its threshold.
    ///
    /// Strictly greater-than, same policy as the failure side.
    pub fn is_success_threshold_exceeded(&self) -> bool {
        self.tallies.read().success_count > self.success_threshold
    }

    /// Current failure tally.
    pub fn failure_count(&self) -> u32 {
        self.tallies.read().failure_count
    }

    /// Current success tally.
    pub fn success_count(&self) -> u32 {
        self.tallies.read().success_count
    }

    /// Configured cool-down window.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
