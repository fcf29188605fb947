//! Resilience patterns for radlens-runtime.
//!
//! This module provides:
//! - Circuit breaker per upstream
//! - Retry with backoff
//! - Fallback strategies

mod circuit_breaker;
mod fallback;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Upstream};
pub use fallback::FallbackStrategy;
pub use retry::RetryPolicy;
