//! Per-user usage limits
//!
//! The guard is a pure decision function over externally supplied counts:
//! callers read the current count from the store, then ask for a verdict.
//! There is no transactional fence between the count read and the record
//! insert that follows a successful batch, so concurrent batches for one
//! user can exceed the cap. See DESIGN.md.

use std::fmt;

/// Which quota a decision refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    Voice,
    Generation,
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaKind::Voice => write!(f, "voice"),
            QuotaKind::Generation => write!(f, "generation"),
        }
    }
}

/// Why a request was denied. The two cases are distinct so callers can
/// report "delete something first" separately from "ask for less".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The cap is already used up; no request of any size can pass.
    LimitReached { cap: usize },
    /// Some allowance remains, but the batch is larger than it.
    ExceedsRemaining { remaining: usize, requested: usize },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::LimitReached { cap } => {
                write!(f, "limit of {} already reached", cap)
            }
            DenyReason::ExceedsRemaining {
                remaining,
                requested,
            } => {
                write!(
                    f,
                    "{} remaining but {} requested",
                    remaining, requested
                )
            }
        }
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow,
    Deny(DenyReason),
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allow)
    }
}

/// Per-user caps.
#[derive(Debug, Clone, Copy)]
pub struct QuotaLimits {
    pub max_voices: usize,
    pub max_generations: usize,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_voices: 1,
            max_generations: 5,
        }
    }
}

/// Accepts or rejects a batch before any synthesis begins.
#[derive(Debug, Clone, Copy)]
pub struct QuotaGuard {
    limits: QuotaLimits,
}

impl QuotaGuard {
    pub fn new(limits: QuotaLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Decide whether `requested` more generations fit under the cap given
    /// `current` already used. `requested` must be at least 1.
    pub fn check_generations(&self, current: usize, requested: usize) -> QuotaDecision {
        debug_assert!(requested >= 1, "a batch always has at least one segment");
        let cap = self.limits.max_generations;
        if current >= cap {
            return QuotaDecision::Deny(DenyReason::LimitReached { cap });
        }
        let remaining = cap - current;
        if requested > remaining {
            return QuotaDecision::Deny(DenyReason::ExceedsRemaining {
                remaining,
                requested,
            });
        }
        QuotaDecision::Allow
    }

    /// Decide whether one more cloned voice fits under the cap.
    pub fn check_voice(&self, current: usize) -> QuotaDecision {
        let cap = self.limits.max_voices;
        if current >= cap {
            return QuotaDecision::Deny(DenyReason::LimitReached { cap });
        }
        QuotaDecision::Allow
    }
}
