//! # Circuit Breaker Errors
//!
//! Error taxonomy for breaker-protected calls. A task's own error is always
//! surfaced unmodified inside [`CircuitBreakerError::OperationFailed`]; the
//! breaker never swallows or retries it.

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open (or a probe slot is taken), rejecting the call
    /// without invoking the task.
    #[error("too many requests: circuit breaker open for {component}")]
    TooManyRequests { component: String },

    /// The task executed and failed; its error is carried unmodified.
    #[error("operation failed: {0}")]
    OperationFailed(E),

    /// Circuit breaker configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
