//! Per-dependency circuit breaker state machine.
//!
//! CLOSED → OPEN on reaching the failure threshold within a rolling window;
//! OPEN → HALF_OPEN once the recovery timeout elapses; HALF_OPEN → CLOSED on
//! enough consecutive trial successes, or back to OPEN on any trial failure.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fathom_core::clock::Clock;
use fathom_core::config::BreakerConfig;
use fathom_core::errors::BreakerError;

/// Health of one named dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of a breaker, for metadata and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub next_probe_at: Option<DateTime<Utc>>,
}

struct BreakerInner {
    state: CircuitState,
    /// Failure timestamps inside the rolling window (CLOSED only).
    failures: VecDeque<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    next_probe_at: Option<DateTime<Utc>>,
    /// Trial permits handed out since entering HALF_OPEN.
    half_open_permits: u32,
    /// Consecutive trial successes since entering HALF_OPEN.
    half_open_successes: u32,
}

/// Generic fault-isolation wrapper around any named dependency call.
///
/// All transitions happen under one internal mutex, so concurrent callers
/// race safely and exactly one transition wins. The lock is never held
/// across a network call; callers acquire, call, then record the outcome.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: VecDeque::new(),
                last_failure_at: None,
                next_probe_at: None,
                half_open_permits: 0,
                half_open_successes: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask permission to call the dependency.
    ///
    /// CLOSED always grants. OPEN rejects without any I/O until the recovery
    /// timeout elapses, then flips to HALF_OPEN and grants trial permits up
    /// to the configured limit.
    pub fn try_acquire(&self) -> Result<(), BreakerError> {
        let now = self.clock.now();
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let probe_at = inner.next_probe_at.unwrap_or(now);
                if now >= probe_at {
                    debug!(breaker = %self.name, "recovery timeout elapsed, half-opening");
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_permits = 1;
                    inner.half_open_successes = 0;
                    Ok(())
                } else {
                    Err(BreakerError::Open {
                        dependency: self.name.clone(),
                        retry_in_ms: (probe_at - now).num_milliseconds().max(0) as u64,
                    })
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_permits < self.config.half_open_max_calls {
                    inner.half_open_permits += 1;
                    Ok(())
                } else {
                    Err(BreakerError::Open {
                        dependency: self.name.clone(),
                        retry_in_ms: 0,
                    })
                }
            }
        }
    }

    /// Report a successful call.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failures.clear();
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_max_calls {
                    info!(breaker = %self.name, "recovered, closing circuit");
                    inner.state = CircuitState::Closed;
                    inner.failures.clear();
                    inner.next_probe_at = None;
                    inner.half_open_permits = 0;
                    inner.half_open_successes = 0;
                }
            }
            // A success from a call that was in flight when the circuit
            // opened; the probe schedule stands.
            CircuitState::Open => {}
        }
    }

    /// Report a failed call (timeout, error, or invalid result).
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.lock();

        inner.last_failure_at = Some(now);

        match inner.state {
            CircuitState::Closed => {
                inner.failures.push_back(now);
                self.prune_window(&mut inner, now);
                if inner.failures.len() as u32 >= self.config.failure_threshold {
                    warn!(
                        breaker = %self.name,
                        failures = inner.failures.len(),
                        "failure threshold reached, opening circuit"
                    );
                    self.open(&mut inner, now);
                }
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "trial call failed, reopening circuit");
                self.open(&mut inner, now);
            }
            CircuitState::Open => {}
        }
    }

    /// Current state without side effects. An elapsed recovery timeout is
    /// only acted on by the next `try_acquire`.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failures.len() as u32,
            last_failure_at: inner.last_failure_at,
            next_probe_at: inner.next_probe_at,
        }
    }

    fn open(&self, inner: &mut BreakerInner, now: DateTime<Utc>) {
        inner.state = CircuitState::Open;
        inner.next_probe_at =
            Some(now + Duration::seconds(self.config.recovery_timeout_secs as i64));
        inner.failures.clear();
        inner.half_open_permits = 0;
        inner.half_open_successes = 0;
    }

    fn prune_window(&self, inner: &mut BreakerInner, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(self.config.failure_window_secs as i64);
        while inner
            .failures
            .front()
            .is_some_and(|&first| first < cutoff)
        {
            inner.failures.pop_front();
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
