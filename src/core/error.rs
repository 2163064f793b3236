//! Error types.
//!
//! Two layers:
//! - [`PhaseError`]: raised by a phase handler from `start`
//! - [`SchedulerError`]: returned by manager APIs
//!
//! Empty-queue pops and conflicting switch-ins are not errors; they
//! return `None` or are filtered.

use std::time::Duration;

use thiserror::Error;

use super::BattlerIndex;
use crate::phase::PhaseKind;

/// Failure inside a phase handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("{0} requires a battler")]
    MissingBattler(PhaseKind),

    #[error("no battler in slot {0}")]
    BattlerNotFound(BattlerIndex),

    #[error("invalid arguments for {kind}: {reason}")]
    InvalidArgs { kind: PhaseKind, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Opaque handle for a phase that has started but not ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompletionToken(pub(crate) u64);

impl CompletionToken {
    /// Get the raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Completion({})", self.0)
    }
}

/// Failure reported by the scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("phase {0} does not exist in the handler table")]
    NoHandler(PhaseKind),

    #[error("{kind} failed to start: {source}")]
    PhaseFailed {
        kind: PhaseKind,
        #[source]
        source: PhaseError,
    },

    #[error("{0} is still in flight")]
    PhaseInFlight(PhaseKind),

    #[error("no in-flight phase for {0}")]
    UnknownToken(CompletionToken),

    #[error("{kind} started {elapsed:?} ago and never ended")]
    Stalled { kind: PhaseKind, elapsed: Duration },

    #[error("cannot queue {kind}: {reason}")]
    InvalidEnqueue { kind: PhaseKind, reason: String },

    #[error("invalid scheduler configuration: {0}")]
    Config(String),
}
