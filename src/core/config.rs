//! Scheduler configuration.
//!
//! Games configure the scheduler at startup by providing a `SchedulerConfig`,
//! either through the builder methods or from JSON:
//!
//! ```
//! use battle_scheduler::core::{EmptyQueuePolicy, SchedulerConfig};
//!
//! let config = SchedulerConfig::from_json_str(
//!     r#"{ "stall_timeout_ms": 5000, "empty_queue": "StartTurn" }"#,
//! ).unwrap();
//! assert_eq!(config.empty_queue, EmptyQueuePolicy::StartTurn);
//! assert_eq!(config.stall_timeout().map(|d| d.as_millis()), Some(5000));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SchedulerError;
use crate::phase::PhaseKind;

/// What the run loop does once every queue is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyQueuePolicy {
    /// Return `RunStatus::Drained` and wait for new work.
    #[default]
    Idle,
    /// Clear the dynamic queues and start a fresh turn.
    StartTurn,
}

/// Complete scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// A started phase that has not ended after this many milliseconds is
    /// reported as stalled. `None` disables stall detection.
    pub stall_timeout_ms: Option<u64>,

    pub empty_queue: EmptyQueuePolicy,

    /// Maximum phases started by a single `run` call.
    pub max_phases_per_run: Option<usize>,

    /// Phases appended after each turn's commands.
    pub turn_end_phases: Vec<PhaseKind>,

    /// Phases dropped when the next wave is a biome transition.
    pub interlude_removals: Vec<PhaseKind>,

    /// Kinds routed through speed-ordered queues.
    pub dynamic_kinds: Vec<PhaseKind>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            stall_timeout_ms: None,
            empty_queue: EmptyQueuePolicy::Idle,
            max_phases_per_run: None,
            turn_end_phases: vec![
                PhaseKind::WeatherEffect,
                PhaseKind::PositionalTag,
                PhaseKind::Berry,
                PhaseKind::CheckStatusEffect,
                PhaseKind::TurnEnd,
            ],
            interlude_removals: vec![
                PhaseKind::WeatherEffect,
                PhaseKind::Berry,
                PhaseKind::CheckStatusEffect,
            ],
            dynamic_kinds: vec![
                PhaseKind::Move,
                PhaseKind::SwitchSummon,
                PhaseKind::PostSummon,
                PhaseKind::PostTurnStatusEffect,
            ],
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SchedulerError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SchedulerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_empty_queue(mut self, policy: EmptyQueuePolicy) -> Self {
        self.empty_queue = policy;
        self
    }

    #[must_use]
    pub fn with_max_phases_per_run(mut self, max: usize) -> Self {
        self.max_phases_per_run = Some(max);
        self
    }

    #[must_use]
    pub fn with_turn_end_phases(mut self, phases: Vec<PhaseKind>) -> Self {
        self.turn_end_phases = phases;
        self
    }

    #[must_use]
    pub fn with_dynamic_kind(mut self, kind: PhaseKind) -> Self {
        if !self.dynamic_kinds.contains(&kind) {
            self.dynamic_kinds.push(kind);
        }
        self
    }

    #[must_use]
    pub fn without_dynamic_kind(mut self, kind: PhaseKind) -> Self {
        self.dynamic_kinds.retain(|k| *k != kind);
        self
    }

    /// Check invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.stall_timeout_ms == Some(0) {
            return Err(SchedulerError::Config(
                "stall_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_phases_per_run == Some(0) {
            return Err(SchedulerError::Config(
                "max_phases_per_run must be positive".to_string(),
            ));
        }
        if self.dynamic_kinds.contains(&PhaseKind::DynamicMarker) {
            return Err(SchedulerError::Config(
                "markers cannot themselves be dynamic".to_string(),
            ));
        }
        Ok(())
    }
}
