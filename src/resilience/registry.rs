//! Per-process breaker registry.
//!
//! # Responsibilities
//! - Own one breaker per named dependency
//! - Route gate checks and outcome reports to the right breaker
//! - Snapshot all states for health reporting
//!
//! # Design Decisions
//! - Explicit, passed-in object: constructed once at startup and injected
//!   through application state, never looked up globally
//! - Breakers are created eagerly for every known dependency and live for
//!   the whole process

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::BreakerConfig;
use crate::resilience::breaker::{BreakerState, CallGuard, CircuitBreaker};
use crate::upstream::Dependency;

/// Registry of circuit breakers, one per upstream dependency.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<&'static str, Arc<CircuitBreaker>>,
    config: BreakerConfig,
}

impl BreakerRegistry {
    /// Create a registry with a breaker for every known dependency.
    pub fn new(config: BreakerConfig) -> Self {
        let breakers = DashMap::new();
        for dependency in Dependency::ALL {
            breakers.insert(
                dependency.name(),
                Arc::new(CircuitBreaker::new(dependency.name(), config.clone())),
            );
        }
        Self { breakers, config }
    }

    /// The breaker guarding `dependency`.
    pub fn breaker(&self, dependency: Dependency) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(dependency.name())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(dependency.name(), self.config.clone()))
            })
            .clone()
    }

    /// Gate check for a call to `dependency`. `None` means the call is
    /// short-circuited; otherwise the returned guard must be resolved
    /// with the call's outcome.
    pub fn before_call(&self, dependency: Dependency) -> Option<CallGuard> {
        self.breaker(dependency).before_call()
    }

    /// Current state of the breaker for `dependency`.
    pub fn current_state(&self, dependency: Dependency) -> BreakerState {
        self.breaker(dependency).current_state()
    }

    /// Snapshot of every breaker's state, for health reporting.
    pub fn states(&self) -> Vec<(&'static str, BreakerState)> {
        let mut states: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| (*entry.key(), entry.value().current_state()))
            .collect();
        states.sort_by_key(|(name, _)| *name);
        states
    }
}
