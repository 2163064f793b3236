//! Phase behaviour, registered per kind.
//!
//! A handler is called when the manager starts a phase. It reads and
//! mutates the battle through [`PhaseContext`], queues follow-up phases, and
//! reports whether the phase ended or is waiting on something outside the
//! scheduler (an animation, a player prompt).

use rustc_hash::FxHashMap;

use crate::core::{BattleState, PhaseError};
use crate::manager::PhaseQueues;

use super::{Phase, PhaseKind};

/// Result of starting a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Finished; the manager moves on.
    Ended,
    /// Started but not finished. The manager stops until the issued
    /// completion token is handed back.
    Suspended,
}

/// What a running phase may touch.
pub struct PhaseContext<'a> {
    pub state: &'a mut BattleState,
    pub queues: &'a mut PhaseQueues,
}

impl<'a> PhaseContext<'a> {
    pub fn new(state: &'a mut BattleState, queues: &'a mut PhaseQueues) -> Self {
        Self { state, queues }
    }
}

/// Behaviour for one phase kind.
pub trait PhaseHandler {
    fn start(
        &mut self,
        phase: &Phase,
        ctx: &mut PhaseContext<'_>,
    ) -> Result<PhaseOutcome, PhaseError>;
}

impl<F> PhaseHandler for F
where
    F: FnMut(&Phase, &mut PhaseContext<'_>) -> Result<PhaseOutcome, PhaseError>,
{
    fn start(
        &mut self,
        phase: &Phase,
        ctx: &mut PhaseContext<'_>,
    ) -> Result<PhaseOutcome, PhaseError> {
        self(phase, ctx)
    }
}

/// Handler table keyed by phase kind.
///
/// Registering a kind twice replaces the earlier handler, which is how
/// games override the built-in behaviour.
#[derive(Default)]
pub struct PhaseHandlers {
    handlers: FxHashMap<PhaseKind, Box<dyn PhaseHandler>>,
}

impl PhaseHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: PhaseKind, handler: impl PhaseHandler + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Register a closure.
    pub fn register_fn<F>(&mut self, kind: PhaseKind, handler: F)
    where
        F: FnMut(&Phase, &mut PhaseContext<'_>) -> Result<PhaseOutcome, PhaseError> + 'static,
    {
        self.register(kind, handler);
    }

    /// Register a handler (builder pattern).
    #[must_use]
    pub fn with(mut self, kind: PhaseKind, handler: impl PhaseHandler + 'static) -> Self {
        self.register(kind, handler);
        self
    }

    /// Register a closure (builder pattern).
    #[must_use]
    pub fn with_fn<F>(mut self, kind: PhaseKind, handler: F) -> Self
    where
        F: FnMut(&Phase, &mut PhaseContext<'_>) -> Result<PhaseOutcome, PhaseError> + 'static,
    {
        self.register(kind, handler);
        self
    }

    pub fn get_mut(&mut self, kind: PhaseKind) -> Option<&mut (dyn PhaseHandler + 'static)> {
        self.handlers.get_mut(&kind).map(|h| h.as_mut())
    }

    #[must_use]
    pub fn contains(&self, kind: PhaseKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: PhaseKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for PhaseHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
