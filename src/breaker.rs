//! # Circuit Breaker Facade
//!
//! The externally-visible handle. Holds the currently active state variant,
//! re-evaluates the transition before every dispatch, and delegates the
//! call to the adopted variant. Transition evaluation is pull-based: an
//! idle breaker sits past its timeout until the next call arrives, and two
//! concurrent calls may both observe the closed state; throughput is
//! preferred over atomic-per-call gating.

use crate::config::CircuitBreakerConfig;
use crate::counters::Counters;
use crate::error::CircuitBreakerError;
use crate::metrics::{CircuitBreakerMetrics, TransitionObserver};
use crate::state::{CircuitState, StateNode};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Lock-free lifetime statistics, separate from the lock-protected window
/// counters the state machine runs on.
#[derive(Debug, Default)]
struct AtomicStats {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    rejected_count: AtomicU64,
    total_duration_nanos: AtomicU64,
}

impl AtomicStats {
    #[inline]
    fn record_success(&self, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_rejected(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(
        &self,
        state: CircuitState,
        window_failures: u32,
        window_successes: u32,
    ) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        let total_duration_nanos = self.total_duration_nanos.load(Ordering::Relaxed);
        let total_duration = Duration::from_nanos(total_duration_nanos);

        let (failure_rate, success_rate, average_duration) = if total_calls > 0 {
            (
                failure_count as f64 / total_calls as f64,
                success_count as f64 / total_calls as f64,
                Duration::from_nanos(total_duration_nanos / total_calls),
            )
        } else {
            (0.0, 0.0, Duration::ZERO)
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count,
            failure_count,
            rejected_count: self.rejected_count.load(Ordering::Relaxed),
            window_failures,
            window_successes,
            current_state: state,
            failure_rate,
            success_rate,
            total_duration,
            average_duration,
        }
    }
}

/// Process-local circuit breaker protecting one downstream dependency.
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    /// Window counters shared by every state variant of this breaker
    counters: Arc<Counters>,

    /// Currently active state variant
    state: RwLock<Arc<StateNode>>,

    /// Lock-free lifetime statistics
    stats: AtomicStats,

    /// Optional hook invoked on every state transition
    observer: Option<Arc<dyn TransitionObserver>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration.
    ///
    /// The breaker starts closed with zeroed counters.
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            success_threshold = config.success_threshold,
            "Circuit breaker initialized"
        );

        let counters = Arc::new(Counters::from_config(&config));
        let initial = Arc::new(StateNode::enter(CircuitState::Closed, Arc::clone(&counters)));

        Self {
            name,
            config,
            counters,
            state: RwLock::new(initial),
            stats: AtomicStats::default(),
            observer: None,
        }
    }

    /// Create a breaker with the default configuration
    /// (failure threshold 5, success threshold 5, 5 second timeout).
    pub fn with_defaults(name: String) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Install a transition observer, invoked on every adopted transition.
    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Execute a synchronous task with circuit breaker protection.
    ///
    /// The transition check runs before dispatch, so the call that follows
    /// a threshold breach is the one that observes the new state. While the
    /// circuit is open the task is never invoked.
    pub fn handle<F, T, E>(&self, task: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let state = self.advance();

        if !state.admit() {
            return Err(self.reject());
        }

        let start = Instant::now();
        let result = task();
        self.finish(&state, start.elapsed(), result.is_ok());

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Execute an asynchronous operation with circuit breaker protection.
    ///
    /// Same admission and settlement rules as [`CircuitBreaker::handle`];
    /// no lock is held across the `.await`.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let state = self.advance();

        if !state.admit() {
            return Err(self.reject());
        }

        let start = Instant::now();
        let result = operation().await;
        self.finish(&state, start.elapsed(), result.is_ok());

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Get current circuit state without advancing the state machine.
    pub fn state(&self) -> CircuitState {
        self.state.read().kind()
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the breaker's configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get a current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.stats.snapshot(
            self.state(),
            self.counters.failure_count(),
            self.counters.success_count(),
        )
    }

    /// Check if circuit is healthy (closed state with low failure rate)
    pub fn is_healthy(&self) -> bool {
        if self.state() != CircuitState::Closed {
            return false;
        }

        let total_calls = self.stats.total_calls.load(Ordering::Relaxed);
        if total_calls < 10 {
            // Too few calls to determine health
            return true;
        }

        let failure_count = self.stats.failure_count.load(Ordering::Relaxed);
        (failure_count as f64 / total_calls as f64) < 0.1
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        self.force(CircuitState::Open);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        self.force(CircuitState::Closed);
    }

    /// Evaluate the transition check and adopt the successor state.
    ///
    /// Fast path takes only the read lock; when a transition is due the
    /// write lock is taken and the check re-run (another caller may have
    /// already adopted it), so each entry action runs exactly once.
    fn advance(&self) -> Arc<StateNode> {
        {
            let current = self.state.read();
            if current.next_state().is_none() {
                return Arc::clone(&current);
            }
        }

        let mut current = self.state.write();
        if let Some(target) = current.next_state() {
            let from = current.kind();
            *current = Arc::new(StateNode::enter(target, Arc::clone(&self.counters)));
            self.announce(from, target);
        }
        Arc::clone(&current)
    }

    /// Swap in `target` unconditionally (manual override path).
    fn force(&self, target: CircuitState) {
        let mut current = self.state.write();
        if current.kind() == target {
            return;
        }
        let from = current.kind();
        *current = Arc::new(StateNode::enter(target, Arc::clone(&self.counters)));
        self.announce(from, target);
    }

    /// Log an adopted transition and notify the observer hook.
    fn announce(&self, from: CircuitState, to: CircuitState) {
        match to {
            CircuitState::Open => error!(
                component = %self.name,
                failure_count = self.counters.failure_count(),
                failure_threshold = self.config.failure_threshold,
                timeout_seconds = self.config.timeout.as_secs(),
                "Circuit breaker opened (failing fast)"
            ),
            CircuitState::HalfOpen => info!(
                component = %self.name,
                success_threshold = self.config.success_threshold,
                "Circuit breaker half-open (probing recovery)"
            ),
            CircuitState::Closed => info!(
                component = %self.name,
                "Circuit breaker closed (recovered)"
            ),
        }

        if let Some(observer) = &self.observer {
            observer.on_transition(&self.name, from, to);
        }
    }

    fn reject<E>(&self) -> CircuitBreakerError<E> {
        self.stats.record_rejected();
        debug!(component = %self.name, "Call rejected while circuit is open");
        CircuitBreakerError::TooManyRequests {
            component: self.name.clone(),
        }
    }

    /// Settle an executed task and record its outcome.
    fn finish(&self, state: &StateNode, duration: Duration, succeeded: bool) {
        state.settle(succeeded);

        if succeeded {
            self.stats.record_success(duration);
            debug!(
                component = %self.name,
                duration_ms = duration.as_millis(),
                "Operation succeeded"
            );
        } else {
            self.stats.record_failure(duration);
            error!(
                component = %self.name,
                duration_ms = duration.as_millis(),
                "Operation failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn config(failure_threshold: u32, success_threshold: u32, timeout_ms: u64) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            timeout: Duration::from_millis(timeout_ms),
            success_threshold,
        }
    }

    fn failing(breaker: &CircuitBreaker) -> Result<&'static str, CircuitBreakerError<&'static str>> {
        breaker.handle(|| Err::<&str, _>("boom"))
    }

    #[test]
    fn test_breaker_starts_closed_and_passes_results_through() {
        let breaker = CircuitBreaker::new("test".to_string(), config(3, 2, 100));

        assert_eq!(breaker.state(), CircuitState::Closed);

        let result: Result<_, CircuitBreakerError<&str>> = breaker.handle(|| Ok(42));
        assert_eq!(result.unwrap(), 42);

        let metrics = breaker.metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 0);
    }

    #[test]
    fn test_task_error_surfaces_unmodified() {
        let breaker = CircuitBreaker::new("test".to_string(), config(5, 2, 100));

        let result = failing(&breaker);
        match result {
            Err(CircuitBreakerError::OperationFailed(e)) => assert_eq!(e, "boom"),
            other => panic!("expected OperationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_breaker_opens_after_threshold_exceeded() {
        // Threshold 2: calls 1-3 execute, call 4 is short-circuited.
        let breaker = CircuitBreaker::new("test".to_string(), config(2, 2, 60_000));

        for _ in 0..3 {
            let _ = failing(&breaker);
            assert_eq!(breaker.state(), CircuitState::Closed);
        }

        let executed = AtomicUsize::new(0);
        let result: Result<&str, _> = breaker.handle(|| {
            executed.fetch_add(1, Ordering::SeqCst);
            Err::<&str, _>("boom")
        });

        assert!(matches!(
            result,
            Err(CircuitBreakerError::TooManyRequests { .. })
        ));
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        assert_eq!(breaker.state(), CircuitState::Open);

        let metrics = breaker.metrics();
        assert_eq!(metrics.rejected_count, 1);
        assert_eq!(metrics.total_calls, 3);
    }

    #[test]
    fn test_breaker_probes_after_timeout_and_recovers() {
        let breaker = CircuitBreaker::new("test".to_string(), config(0, 0, 40));

        // One failure trips a zero threshold; the follow-up call opens.
        let _ = failing(&breaker);
        assert!(matches!(
            failing(&breaker),
            Err(CircuitBreakerError::TooManyRequests { .. })
        ));
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(60));

        // First call after the cool-down is a real probe.
        let result: Result<_, CircuitBreakerError<&str>> = breaker.handle(|| Ok("recovered"));
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        // One success exceeds a zero success threshold; next call closes.
        let result: Result<_, CircuitBreakerError<&str>> = breaker.handle(|| Ok("ok"));
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().window_failures, 0);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new("test".to_string(), config(0, 1, 30));

        let _ = failing(&breaker);
        let _ = failing(&breaker); // opens
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(50));

        // Probe fails; the next evaluation reopens and restarts the window.
        let _ = failing(&breaker);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        assert!(matches!(
            failing(&breaker),
            Err(CircuitBreakerError::TooManyRequests { .. })
        ));
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_force_operations() {
        let breaker = CircuitBreaker::new("test".to_string(), config(1, 1, 1000));

        breaker.force_open();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(matches!(
            failing(&breaker),
            Err(CircuitBreakerError::TooManyRequests { .. })
        ));

        breaker.force_closed();
        assert_eq!(breaker.state(), CircuitState::Closed);
        let result: Result<_, CircuitBreakerError<&str>> = breaker.handle(|| Ok("ok"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_is_healthy_reflects_state_and_failure_rate() {
        let breaker = CircuitBreaker::new("test".to_string(), config(100, 2, 1000));

        // Young breaker with few calls is considered healthy.
        assert!(breaker.is_healthy());

        for _ in 0..20 {
            let _: Result<&str, CircuitBreakerError<&str>> = breaker.handle(|| Ok("ok"));
        }
        assert!(breaker.is_healthy());

        for _ in 0..20 {
            let _ = failing(&breaker);
        }
        // 20 failures out of 40 calls is far above the 10% budget.
        assert!(!breaker.is_healthy());
    }

    #[tokio::test]
    async fn test_async_call_normal_operation() {
        let breaker = CircuitBreaker::new("test".to_string(), config(3, 2, 100));

        let result = breaker.call(|| async { Ok::<_, String>("success") }).await;
        assert!(result.is_ok());

        let metrics = breaker.metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
    }

    #[tokio::test]
    async fn test_async_call_opens_and_fails_fast() {
        let breaker = CircuitBreaker::new("test".to_string(), config(1, 2, 60_000));

        let _ = breaker.call(|| async { Err::<String, _>("error") }).await;
        let _ = breaker.call(|| async { Err::<String, _>("error") }).await;

        let result = breaker
            .call(|| async { Ok::<_, String>("should not execute") })
            .await;
        assert!(matches!(
            result,
            Err(CircuitBreakerError::TooManyRequests { .. })
        ));
    }

    #[tokio::test]
    async fn test_async_call_recovery() {
        let breaker = CircuitBreaker::new("test".to_string(), config(0, 0, 50));

        let _ = breaker.call(|| async { Err::<String, _>("error") }).await;
        let _ = breaker.call(|| async { Err::<String, _>("error") }).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        sleep(Duration::from_millis(70)).await;

        let result = breaker.call(|| async { Ok::<_, String>("success") }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        let result = breaker.call(|| async { Ok::<_, String>("success") }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
