//! # fathom-resilience
//!
//! Fault isolation for named dependencies. A [`CircuitBreaker`] stops calling
//! a failing dependency for a cooldown period instead of retrying
//! indefinitely; the [`BreakerRegistry`] hands out one breaker per dependency
//! name for the process lifetime.
//!
//! The breaker is policy-agnostic: callers decide what counts as a failure
//! (timeout, error, empty result) and report it via `record_failure`.

mod breaker;
mod registry;

pub use breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use registry::BreakerRegistry;
