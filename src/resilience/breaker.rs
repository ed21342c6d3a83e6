//! Circuit breaker for upstream dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: testing if the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate >= threshold over a full sliding window
//! Open → Half-Open: after the configured cool-down
//! Half-Open → Closed: a trial call succeeds
//! Half-Open → Open: a trial call fails
//! ```
//!
//! # Design Decisions
//! - Per-dependency breaker (not global)
//! - Fail fast in Open state (no waiting for a timeout to fire)
//! - Bounded trial permits in Half-Open (prevents hammering a recovering
//!   dependency)
//! - Open → Half-Open happens lazily on the next gate check, so no
//!   background timer task is needed
//! - The gate hands out an RAII guard: a guarded call whose future is
//!   dropped mid-flight releases its permit instead of reporting an
//!   outcome, so cancelled trials can never wedge the Half-Open state

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Gate state of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => f.write_str("closed"),
            BreakerState::Open => f.write_str("open"),
            BreakerState::HalfOpen => f.write_str("half_open"),
        }
    }
}

/// Permission to attempt one guarded call.
///
/// Consume it with [`CallGuard::success`] or [`CallGuard::failure`] once
/// the call resolves. Dropping the guard without reporting — a cancelled
/// fetch, an aborted aggregation — releases the underlying trial permit
/// without recording an outcome, since a cancellation says nothing about
/// upstream health.
#[derive(Debug)]
pub struct CallGuard {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    resolved: bool,
}

impl CallGuard {
    /// Report a successful guarded call.
    pub fn success(mut self) {
        self.resolved = true;
        self.breaker.report(self.generation, false);
    }

    /// Report a failed guarded call.
    pub fn failure(mut self) {
        self.resolved = true;
        self.breaker.report(self.generation, true);
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if !self.resolved {
            self.breaker.release_abandoned(self.generation);
        }
    }
}

/// Mutable breaker bookkeeping, serialized behind one mutex so concurrent
/// outcome reports cannot lose updates or race a state transition.
#[derive(Debug)]
struct Inner {
    state: BreakerState,
    /// Most recent call outcomes, `true` = failure. Capped at the
    /// configured sliding window size.
    window: VecDeque<bool>,
    /// Instant the breaker last entered Open.
    opened_at: Option<Instant>,
    /// Trials currently in flight while Half-Open. Every resolved trial
    /// leaves the state, so this only ever counts unresolved ones.
    half_open_permits: u32,
    /// Bumped on every state transition. Guards stamped with an older
    /// generation are stragglers; their reports no longer belong to the
    /// current window and are discarded.
    generation: u64,
}

/// A circuit breaker guarding one named dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a breaker in the Closed state.
    pub fn new(name: &'static str, config: BreakerConfig) -> Self {
        metrics::record_breaker_state(name, BreakerState::Closed);
        Self {
            name,
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                window: VecDeque::new(),
                opened_at: None,
                half_open_permits: 0,
                generation: 0,
            }),
        }
    }

    /// Name of the guarded dependency.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Gate check: may the next call to this dependency be attempted?
    ///
    /// `None` means short-circuited. While Open, flips to Half-Open once
    /// the cool-down has elapsed and hands out the first trial permit.
    pub fn before_call(self: &Arc<Self>) -> Option<CallGuard> {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        let allowed = match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.wait_duration())
                    .unwrap_or(true);
                if cooled_down {
                    self.transition(&mut inner, BreakerState::HalfOpen);
                    inner.half_open_permits = 1;
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if inner.half_open_permits < self.config.permitted_calls_in_half_open_state {
                    inner.half_open_permits += 1;
                    true
                } else {
                    false
                }
            }
        };

        allowed.then(|| CallGuard {
            breaker: self.clone(),
            generation: inner.generation,
            resolved: false,
        })
    }

    /// Current state, for health reporting. Read-only: an Open breaker
    /// whose cool-down has elapsed is reported as Half-Open without
    /// mutating anything.
    pub fn current_state(&self) -> BreakerState {
        let inner = self.inner.lock().expect("breaker mutex poisoned");
        match inner.state {
            BreakerState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.wait_duration())
                    .unwrap_or(true);
                if cooled_down {
                    BreakerState::HalfOpen
                } else {
                    BreakerState::Open
                }
            }
            state => state,
        }
    }

    /// Record the outcome of a guarded call issued in `generation`.
    fn report(&self, generation: u64, failed: bool) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        if inner.generation != generation {
            tracing::debug!(
                dependency = self.name,
                "Discarding stale call outcome from before a state transition"
            );
            return;
        }
        match inner.state {
            BreakerState::Closed => {
                Self::record_outcome(&mut inner, self.config.sliding_window_size, failed);
                if failed && self.should_trip(&inner) {
                    self.transition(&mut inner, BreakerState::Open);
                    inner.opened_at = Some(Instant::now());
                    inner.window.clear();
                    inner.half_open_permits = 0;
                }
            }
            BreakerState::HalfOpen => {
                if failed {
                    // Failed trial: back to Open, cool-down restarts.
                    self.transition(&mut inner, BreakerState::Open);
                    inner.opened_at = Some(Instant::now());
                } else {
                    // One good trial is proof enough of recovery.
                    self.transition(&mut inner, BreakerState::Closed);
                    inner.window.clear();
                    inner.opened_at = None;
                }
                inner.half_open_permits = 0;
            }
            // Unreachable with a matching generation; transitions into
            // Open always bump it.
            BreakerState::Open => {}
        }
    }

    /// Reclaim the permit of a guarded call that was dropped without
    /// resolving, so cancellations cannot exhaust the trial budget.
    fn release_abandoned(&self, generation: u64) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        if inner.generation != generation {
            return;
        }
        if inner.state == BreakerState::HalfOpen && inner.half_open_permits > 0 {
            inner.half_open_permits -= 1;
            tracing::debug!(dependency = self.name, "Trial call abandoned, permit released");
        }
    }

    fn record_outcome(inner: &mut Inner, window_size: usize, failed: bool) {
        if inner.window.len() == window_size {
            inner.window.pop_front();
        }
        inner.window.push_back(failed);
    }

    /// Failure rate is only meaningful over a full window; integer math
    /// avoids float thresholds.
    fn should_trip(&self, inner: &Inner) -> bool {
        if inner.window.len() < self.config.sliding_window_size {
            return false;
        }
        let failures = inner.window.iter().filter(|&&failed| failed).count();
        failures * 100 >= self.config.failure_rate_threshold as usize * inner.window.len()
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        tracing::warn!(
            dependency = self.name,
            from = %from,
            to = %to,
            "Circuit breaker state transition"
        );
        metrics::record_breaker_state(self.name, to);
    }
}
