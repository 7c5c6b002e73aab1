//! # Circuit Breaker State Machine
//!
//! The three state variants (closed, open, half-open) as a tagged enum over
//! a shared [`Counters`] handle. Each variant knows its transition check
//! ([`StateNode::next_state`]) and its dispatch behavior, split into
//! [`StateNode::admit`] and [`StateNode::settle`] so the synchronous and
//! asynchronous entry points share one set of bookkeeping rules.
//!
//! Entry actions run exactly once, inside [`StateNode::enter`]:
//! - Closed resets the failure tally (clean slate on every re-close)
//! - Open stamps the cool-down window start
//! - Half-open resets the success tally
//!
//! The transition check is deliberately side-effect free and returns `None`
//! when the breaker stays put, so re-evaluating it on every call can never
//! re-run an entry action.

use crate::counters::Counters;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a single probe call allowed at a time
    HalfOpen,
}

/// The active state variant of one circuit breaker.
///
/// Variants are created on transition-in and discarded on transition-out;
/// apart from the half-open probe flags they carry no state of their own,
/// only the shared counters handle.
#[derive(Debug)]
pub(crate) enum StateNode {
    Closed {
        counters: Arc<Counters>,
    },
    Open {
        counters: Arc<Counters>,
    },
    HalfOpen {
        counters: Arc<Counters>,
        /// Set when a probe since entry has failed; cleared by a later
        /// successful probe. Drives the half-open → open transition.
        failed: AtomicBool,
        /// Single-probe gate: only one task may be in flight while the
        /// dependency's health is being tested.
        in_flight: AtomicBool,
    },
}

impl StateNode {
    /// Construct the variant for `target`, running its entry action.
    pub(crate) fn enter(target: CircuitState, counters: Arc<Counters>) -> Self {
        match target {
            CircuitState::Closed => {
                counters.reset_failure();
                StateNode::Closed { counters }
            }
            CircuitState::Open => {
                counters.start_timeout();
                StateNode::Open { counters }
            }
            CircuitState::HalfOpen => {
                counters.reset_success();
                StateNode::HalfOpen {
                    counters,
                    failed: AtomicBool::new(false),
                    in_flight: AtomicBool::new(false),
                }
            }
        }
    }

    /// The reporting tag for this variant.
    pub(crate) fn kind(&self) -> CircuitState {
        match self {
            StateNode::Closed { .. } => CircuitState::Closed,
            StateNode::Open { .. } => CircuitState::Open,
            StateNode::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Transition check: the successor state, or `None` to stay put.
    ///
    /// Pure read of the counters and flags; entry actions only happen once
    /// the facade adopts the returned successor via [`StateNode::enter`].
    pub(crate) fn next_state(&self) -> Option<CircuitState> {
        match self {
            StateNode::Closed { counters } => counters
                .is_failure_threshold_exceeded()
                .then_some(CircuitState::Open),
            StateNode::Open { counters } => counters
                .is_timeout_expired()
                .then_some(CircuitState::HalfOpen),
            StateNode::HalfOpen {
                counters, failed, ..
            } => {
                // Recovery first: enough successes close the breaker even
                // if a stray probe failure is still flagged.
                if counters.is_success_threshold_exceeded() {
                    Some(CircuitState::Closed)
                } else if failed.load(Ordering::Acquire) {
                    Some(CircuitState::Open)
                } else {
                    None
                }
            }
        }
    }

    /// Whether a call may execute its task in this state.
    ///
    /// Open rejects everything. Half-open admits one probe at a time by
    /// claiming the in-flight slot; the slot is released in
    /// [`StateNode::settle`].
    pub(crate) fn admit(&self) -> bool {
        match self {
            StateNode::Closed { .. } => true,
            StateNode::Open { .. } => false,
            StateNode::HalfOpen { in_flight, .. } => in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
        }
    }

    /// Record an executed task's outcome. Must only be called after a
    /// successful [`StateNode::admit`].
    pub(crate) fn settle(&self, succeeded: bool) {
        match self {
            StateNode::Closed { counters } => {
                if !succeeded {
                    counters.increment_failure();
                }
            }
            StateNode::Open { .. } => {
                debug_assert!(false, "open state never admits a call");
            }
            StateNode::HalfOpen {
                counters,
                failed,
                in_flight,
            } => {
                if succeeded {
                    let _ = failed.compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire);
                    counters.increment_success();
                } else {
                    let _ = failed.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);
                }
                in_flight.store(false, Ordering::Release);
            }
        }
    }
}
