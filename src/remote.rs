//! Simulated Remote Call
//!
//! Stand-in for the network boundary: wait a random duration inside a
//! configured window, then hand the payload back unchanged or fail with a
//! generic network error. Whether a call fails is decided by an injected
//! [`OutcomePolicy`], so tests can be deterministic while the demo stays
//! random.
//!
//! Callers only see `Result<T, RemoteError>`; swapping this for a real HTTP
//! client does not change them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The simulated request never produced a response
    #[error("Network error")]
    Network { endpoint: String },
}

// ============================================================================
// Outcome Policies
// ============================================================================

/// Decides whether a single simulated operation succeeds
pub trait OutcomePolicy: Send + Sync {
    /// Policy name for logging
    fn name(&self) -> &'static str;

    fn succeeds(&self) -> bool;
}

/// Every call succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSucceed;

impl OutcomePolicy for AlwaysSucceed {
    fn name(&self) -> &'static str {
        "always_succeed"
    }

    fn succeeds(&self) -> bool {
        true
    }
}

/// Every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl OutcomePolicy for AlwaysFail {
    fn name(&self) -> &'static str {
        "always_fail"
    }

    fn succeeds(&self) -> bool {
        false
    }
}

/// Succeeds with a fixed probability
#[derive(Debug, Clone, Copy)]
pub struct Probabilistic {
    success_rate: f64,
}

impl Probabilistic {
    /// `success_rate` is clamped to `[0, 1]`; NaN counts as 0.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl OutcomePolicy for Probabilistic {
    fn name(&self) -> &'static str {
        "probabilistic"
    }

    fn succeeds(&self) -> bool {
        rand::thread_rng().gen_bool(self.success_rate)
    }
}

/// Replays a fixed sequence of outcomes, then falls back to `exhausted`
pub struct Scripted {
    outcomes: Mutex<VecDeque<bool>>,
    exhausted: bool,
}

impl Scripted {
    pub fn new(outcomes: impl IntoIterator<Item = bool>, exhausted: bool) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            exhausted,
        }
    }

    /// Outcomes not yet consumed
    pub fn remaining(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl OutcomePolicy for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn succeeds(&self) -> bool {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.exhausted)
    }
}

/// Build the policy a configured success rate describes.
///
/// The two endpoints map to the deterministic policies so a config of `1.0`
/// never draws from the RNG.
pub fn policy_for_rate(rate: f64) -> Arc<dyn OutcomePolicy> {
    if rate >= 1.0 {
        Arc::new(AlwaysSucceed)
    } else if rate <= 0.0 {
        Arc::new(AlwaysFail)
    } else {
        Arc::new(Probabilistic::new(rate))
    }
}

// ============================================================================
// Delay Window
// ============================================================================

/// Inclusive latency window in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// Bounds are swapped if given in the wrong order
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// No latency at all
    pub const fn instant() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
        }
    }

    pub fn sample(&self) -> Duration {
        let ms = if self.min_ms == self.max_ms {
            self.min_ms
        } else {
            rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for DelayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}ms", self.min_ms, self.max_ms)
    }
}

// ============================================================================
// Simulated Call
// ============================================================================

/// Request method label, only used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delay-then-resolve-or-reject primitive
#[derive(Clone)]
pub struct SimulatedCall {
    delay: DelayRange,
    policy: Arc<dyn OutcomePolicy>,
}

impl SimulatedCall {
    pub fn new(delay: DelayRange, policy: Arc<dyn OutcomePolicy>) -> Self {
        Self { delay, policy }
    }

    /// Instant, always-successful calls
    pub fn instant() -> Self {
        Self::new(DelayRange::instant(), Arc::new(AlwaysSucceed))
    }

    /// Network side of the simulation as described by config
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            DelayRange::new(config.min_delay_ms, config.max_delay_ms),
            policy_for_rate(config.network_success_rate),
        )
    }

    /// Wait, then return `payload` or a network error.
    ///
    /// The delay is paid on both outcomes. Once started the call always runs
    /// to completion.
    pub async fn call<T: Send>(
        &self,
        endpoint: &str,
        method: Method,
        payload: T,
    ) -> Result<T, RemoteError> {
        let delay = self.delay.sample();
        debug!(
            endpoint,
            method = %method,
            delay_ms = delay.as_millis() as u64,
            policy = self.policy.name(),
            "Simulated call started"
        );

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !self.policy.succeeds() {
            warn!(endpoint, method = %method, "Simulated call failed");
            return Err(RemoteError::Network {
                endpoint: endpoint.to_string(),
            });
        }

        info!(
            endpoint,
            method = %method,
            delay_ms = delay.as_millis() as u64,
            "[API Simulation]"
        );
        Ok(payload)
    }
}

impl fmt::Debug for SimulatedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedCall")
            .field("delay", &self.delay)
            .field("policy", &self.policy.name())
            .finish()
    }
}
