//! Circuit breaker per upstream.
//!
//! When an upstream fails repeatedly the circuit opens and analyses skip
//! the call entirely, going straight to the fallback path.
//!
//! | State | On success | On failure | On recovery timeout |
//! |-------|-----------|------------|---------------------|
//! | **Closed** | reset failures | count; open at threshold | - |
//! | **Open** | - | - | half-open |
//! | **HalfOpen** | count; close at threshold | reopen | - |

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// External dependencies guarded by a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    TextGeneration,
    ImageClassification,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Upstream::TextGeneration => "text_generation",
            Upstream::ImageClassification => "image_classification",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before a recovery attempt, e.g. `"30s"`
    #[serde(with = "crate::config::duration")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { successes: u32 },
}

/// Independent circuits keyed by [`Upstream`].
pub struct CircuitBreaker {
    states: RwLock<HashMap<Upstream, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether a call to `upstream` may be attempted now.
    ///
    /// An open circuit whose recovery timeout has passed moves to half-open
    /// and permits the call.
    pub fn permits(&self, upstream: Upstream) -> bool {
        let mut states = self.states.write();
        match states.get(&upstream).cloned() {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    states.insert(upstream, CircuitState::HalfOpen { successes: 0 });
                    tracing::info!(upstream = %upstream, "Circuit half-open for recovery test");
                    true
                } else {
                    false
                }
            }
            _ => true,
        }
    }

    pub fn record_success(&self, upstream: Upstream) {
        let mut states = self.states.write();
        match states.get(&upstream).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(upstream, CircuitState::Closed { failures: 0 });
                    tracing::info!(upstream = %upstream, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        upstream,
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(upstream, CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, upstream: Upstream) {
        let mut states = self.states.write();
        let failures = match states.get(&upstream).cloned() {
            Some(CircuitState::Closed { failures }) => failures,
            None => 0,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    upstream,
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(upstream = %upstream, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                upstream,
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                upstream = %upstream,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                upstream,
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    pub fn state(&self, upstream: Upstream) -> CircuitState {
        self.states
            .read()
            .get(&upstream)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Close every circuit.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn breaker(failure_threshold: u32, recovery_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout,
            success_threshold: 2,
        })
    }

    #[test]
    fn test_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(cb.permits(Upstream::TextGeneration));
        assert_eq!(
            cb.state(Upstream::TextGeneration),
            CircuitState::Closed { failures: 0 }
        );
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(2, Duration::from_secs(60));

        cb.record_failure(Upstream::TextGeneration);
        assert!(cb.permits(Upstream::TextGeneration));

        cb.record_failure(Upstream::TextGeneration);
        assert!(!cb.permits(Upstream::TextGeneration));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::default();

        cb.record_failure(Upstream::TextGeneration);
        cb.record_failure(Upstream::TextGeneration);
        cb.record_success(Upstream::TextGeneration);
        cb.record_failure(Upstream::TextGeneration);
        cb.record_failure(Upstream::TextGeneration);

        assert!(cb.permits(Upstream::TextGeneration));
    }

    #[test]
    fn test_upstreams_are_independent() {
        let cb = breaker(1, Duration::from_secs(60));
        cb.record_failure(Upstream::ImageClassification);

        assert!(!cb.permits(Upstream::ImageClassification));
        assert!(cb.permits(Upstream::TextGeneration));
    }

    #[test]
    fn test_recovery_cycle() {
        let cb = breaker(1, Duration::ZERO);
        cb.record_failure(Upstream::TextGeneration);

        // Zero recovery timeout: next check goes half-open
        assert!(cb.permits(Upstream::TextGeneration));
        assert_eq!(
            cb.state(Upstream::TextGeneration),
            CircuitState::HalfOpen { successes: 0 }
        );

        cb.record_success(Upstream::TextGeneration);
        cb.record_success(Upstream::TextGeneration);
        assert_eq!(
            cb.state(Upstream::TextGeneration),
            CircuitState::Closed { failures: 0 }
        );
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(1, Duration::ZERO);
        cb.record_failure(Upstream::TextGeneration);
        assert!(cb.permits(Upstream::TextGeneration));

        cb.record_failure(Upstream::TextGeneration);
        assert!(matches!(
            cb.state(Upstream::TextGeneration),
            CircuitState::Open { .. }
        ));
    }

    #[test]
    fn test_reset() {
        let cb = breaker(1, Duration::from_secs(60));
        cb.record_failure(Upstream::TextGeneration);
        cb.reset();
        assert!(cb.permits(Upstream::TextGeneration));
    }

    proptest! {
        #[test]
        fn prop_opens_only_after_consecutive_failures(
            threshold in 1u32..6,
            outcomes in proptest::collection::vec(any::<bool>(), 0..30),
        ) {
            let cb = breaker(threshold, Duration::from_secs(60));
            let mut streak = 0u32;
            let mut opened = false;

            for success in outcomes {
                if opened {
                    break;
                }
                if success {
                    cb.record_success(Upstream::TextGeneration);
                    streak = 0;
                } else {
                    cb.record_failure(Upstream::TextGeneration);
                    streak += 1;
                }
                opened = streak >= threshold;
                prop_assert_eq!(cb.permits(Upstream::TextGeneration), !opened);
            }
        }
    }
}
