//! Injectable time source.
//!
//! Invariant checks (OTP expiry, resend cooldowns, billing-week boundaries)
//! never read the ambient wall clock directly; they take a [`Clock`] so the
//! same code path is deterministic under test.

use std::sync::Arc;

use crate::types::Timestamp;

/// A source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// Shared clock handle stored in application state.
pub type SharedClock = Arc<dyn Clock>;

/// Fixed clock for tests. Set the instant explicitly and advance it by hand.
#[derive(Debug, Clone)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
