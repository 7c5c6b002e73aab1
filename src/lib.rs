#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Circuit Breaker
//!
//! Process-local, concurrency-safe circuit breaker engine. Wraps execution
//! of an arbitrary unit of work and protects callers from repeatedly
//! invoking a failing downstream dependency.
//!
//! ## State machine
//!
//! - **Closed**: normal operation; tasks run, failures are tallied. Opens
//!   once the failure tally strictly exceeds its threshold.
//! - **Open**: tasks are rejected immediately with
//!   [`CircuitBreakerError::TooManyRequests`] for the duration of the
//!   cool-down window. No task ever reaches the dependency.
//! - **Half-open**: a single probe at a time tests recovery; enough
//!   successes close the breaker, one observed failure reopens it.
//!
//! Transitions are evaluated lazily, before each dispatch; there is no
//! background timer. An idle breaker past its timeout transitions on the
//! next call, not on its own.
//!
//! ## Module Organization
//!
//! - [`breaker`] - The [`CircuitBreaker`] facade and its dispatch loop
//! - [`counters`] - Lock-protected failure/success tallies shared across states
//! - [`state`] - The closed/open/half-open state variants
//! - [`config`] - Per-breaker and file-loadable system configuration
//! - [`error`] - The [`CircuitBreakerError`] taxonomy
//! - [`metrics`] - Metrics snapshots and the transition observer hook
//! - [`manager`] - Registry of named breakers with aggregated metrics
//!
//! ## Quick Start
//!
//! ```rust
//! use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
//!
//! let breaker = CircuitBreaker::new("payments".to_string(), CircuitBreakerConfig::default());
//!
//! let result: Result<&str, CircuitBreakerError<std::io::Error>> =
//!     breaker.handle(|| Ok("charged"));
//! assert_eq!(result.unwrap(), "charged");
//! ```

pub mod breaker;
pub mod config;
pub mod counters;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod state;

pub use breaker::CircuitBreaker;
pub use config::{
    CircuitBreakerComponentConfig, CircuitBreakerConfig, CircuitBreakerSystemConfig,
    GlobalCircuitBreakerSettings,
};
pub use error::CircuitBreakerError;
pub use manager::CircuitBreakerManager;
pub use metrics::{
    CircuitBreakerMetrics, SystemCircuitBreakerMetrics, TracingTransitionObserver,
    TransitionObserver,
};
pub use state::CircuitState;
