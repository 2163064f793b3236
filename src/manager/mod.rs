//! The phase manager: decides what runs next and runs it.
//!
//! ## Run loop
//!
//! [`PhaseManager::run`] repeatedly picks the next phase and starts it with
//! the handler registered for its kind. A handler that ends the phase
//! returns [`PhaseOutcome::Ended`] and the loop continues. A handler waiting
//! on the presentation layer returns [`PhaseOutcome::Suspended`]; `run` then
//! hands back a [`CompletionToken`] and nothing else starts until that token
//! is passed to [`PhaseManager::complete`] (or [`PhaseManager::resume`]).
//!
//! ## Picking
//!
//! 1. Follow-ups of a phase from a draining dynamic queue
//! 2. The rest of that dynamic queue, re-sorted on every pop
//! 3. The main tree; a marker activates its dynamic queue
//!
//! When everything is empty the configured [`EmptyQueuePolicy`] applies.
//!
//! ```
//! use battle_scheduler::core::{BattleState, SchedulerConfig};
//! use battle_scheduler::manager::{PhaseManager, RunStatus};
//! use battle_scheduler::phase::{Phase, PhaseHandlers, PhaseKind, PhaseOutcome};
//!
//! let mut manager = PhaseManager::new(SchedulerConfig::default()).unwrap();
//! let mut handlers = PhaseHandlers::new()
//!     .with_fn(PhaseKind::Message, |_, _| Ok(PhaseOutcome::Ended));
//! let mut state = BattleState::new(1);
//!
//! manager.push_phase(Phase::message("hello"));
//! assert_eq!(manager.run(&mut state, &mut handlers), Ok(RunStatus::Drained));
//! assert_eq!(state.history_kinds(), vec![PhaseKind::Message]);
//! ```

mod queues;

pub use queues::{EntranceParams, EntranceTiming, PhaseQueues, SwitchOutParams, SwitchOutTiming};

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::core::{
    BattleState, CompletionToken, EmptyQueuePolicy, SchedulerConfig, SchedulerError,
};
use crate::phase::{Phase, PhaseArgs, PhaseContext, PhaseHandlers, PhaseKind, PhaseOutcome};

/// Why [`PhaseManager::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Nothing left to run.
    Drained,
    /// A phase is waiting on this token.
    Suspended(CompletionToken),
    /// The per-run phase limit was reached; call `run` again.
    Yielded,
}

/// A phase that started and has not ended.
#[derive(Clone, Debug)]
struct InFlight {
    phase: Phase,
    token: CompletionToken,
    started_at: Instant,
}

enum Started {
    Ended,
    Suspended(CompletionToken),
}

/// Owns the queues and the phase in flight.
#[derive(Debug)]
pub struct PhaseManager {
    config: SchedulerConfig,
    queues: PhaseQueues,
    current: Option<InFlight>,
    standby: Option<InFlight>,
    next_token: u64,
}

impl PhaseManager {
    /// Create a manager, validating `config`.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            queues: PhaseQueues::new(&config),
            config,
            current: None,
            standby: None,
            next_token: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[must_use]
    pub fn queues(&self) -> &PhaseQueues {
        &self.queues
    }

    pub fn queues_mut(&mut self) -> &mut PhaseQueues {
        &mut self.queues
    }

    /// The phase in flight, if one is suspended.
    #[must_use]
    pub fn current_phase(&self) -> Option<&Phase> {
        self.current.as_ref().map(|f| &f.phase)
    }

    /// Token the in-flight phase is waiting on.
    #[must_use]
    pub fn current_token(&self) -> Option<CompletionToken> {
        self.current.as_ref().map(|f| f.token)
    }

    /// The phase parked by [`override_phase`](Self::override_phase).
    #[must_use]
    pub fn standby_phase(&self) -> Option<&Phase> {
        self.standby.as_ref().map(|f| &f.phase)
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    // === Enqueueing (delegates to the queues) ===

    pub fn push_phase(&mut self, phase: Phase) {
        self.queues.push_phase(phase);
    }

    pub fn unshift_phase(&mut self, phase: Phase) {
        self.queues.unshift_phase(phase);
    }

    pub fn push_new(&mut self, kind: PhaseKind, args: PhaseArgs) {
        self.queues.push_new(kind, args);
    }

    pub fn unshift_new(&mut self, kind: PhaseKind, args: PhaseArgs) {
        self.queues.unshift_new(kind, args);
    }

    pub fn find_phase(&self, predicate: impl Fn(&Phase) -> bool) -> Option<&Phase> {
        self.queues.find_phase(predicate)
    }

    pub fn try_remove_phase(&mut self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.queues.try_remove_phase(kind, predicate)
    }

    pub fn on_interlude(&mut self) {
        self.queues.on_interlude();
    }

    pub fn start_dynamic_phase_type(&mut self, kind: PhaseKind) {
        self.queues.start_dynamic_phase_type(kind);
    }

    // === Lifecycle ===

    /// Drop every queued phase and the standby phase.
    pub fn clear_all_phases(&mut self) {
        self.queues.clear_all();
        self.standby = None;
    }

    /// Reset the queues and head for the title screen.
    pub fn to_title_screen(&mut self, add_login: bool) {
        self.clear_all_phases();
        if add_login {
            self.queues.unshift_phase(Phase::new(PhaseKind::Login));
        }
        self.queues.unshift_phase(Phase::new(PhaseKind::Title));
        info!(add_login, "returning to title screen");
    }

    // === Running ===

    /// Start phases until the queues are empty, a phase suspends, or the
    /// per-run limit is hit.
    pub fn run(
        &mut self,
        state: &mut BattleState,
        handlers: &mut PhaseHandlers,
    ) -> Result<RunStatus, SchedulerError> {
        if let Some(in_flight) = &self.current {
            return Err(SchedulerError::PhaseInFlight(in_flight.phase.kind()));
        }

        let mut started = 0usize;
        loop {
            if self
                .config
                .max_phases_per_run
                .is_some_and(|max| started >= max)
            {
                debug!(started, "yielding");
                return Ok(RunStatus::Yielded);
            }

            let phase = match self.queues.next_phase(state) {
                Some(phase) => phase,
                None => match self.config.empty_queue {
                    EmptyQueuePolicy::Idle => return Ok(RunStatus::Drained),
                    EmptyQueuePolicy::StartTurn => {
                        self.queues.clear_dynamic();
                        info!(turn = state.turn + 1, "starting turn");
                        Phase::new(PhaseKind::TurnInit)
                    }
                },
            };

            if phase.is_cancelled() {
                debug!(phase = %phase, "discarding cancelled phase");
                continue;
            }

            started += 1;
            if let Started::Suspended(token) = self.start_phase(phase, state, handlers)? {
                return Ok(RunStatus::Suspended(token));
            }
        }
    }

    /// End the in-flight phase.
    ///
    /// A phase parked by an override becomes current again.
    pub fn complete(&mut self, token: CompletionToken) -> Result<(), SchedulerError> {
        let in_flight = match self.current.take() {
            Some(in_flight) if in_flight.token == token => in_flight,
            other => {
                self.current = other;
                return Err(SchedulerError::UnknownToken(token));
            }
        };
        debug!(phase = %in_flight.phase, %token, "end phase");
        self.current = self.standby.take();
        Ok(())
    }

    /// [`complete`](Self::complete), then [`run`](Self::run).
    pub fn resume(
        &mut self,
        token: CompletionToken,
        state: &mut BattleState,
        handlers: &mut PhaseHandlers,
    ) -> Result<RunStatus, SchedulerError> {
        self.complete(token)?;
        if let Some(in_flight) = &self.current {
            return Ok(RunStatus::Suspended(in_flight.token));
        }
        self.run(state, handlers)
    }

    /// Start `phase` immediately, parking the in-flight phase.
    ///
    /// Returns `false` without starting anything if a phase is already
    /// parked. The parked phase becomes current again once `phase` ends.
    pub fn override_phase(
        &mut self,
        phase: Phase,
        state: &mut BattleState,
        handlers: &mut PhaseHandlers,
    ) -> Result<bool, SchedulerError> {
        if self.standby.is_some() {
            return Ok(false);
        }

        self.standby = self.current.take();
        match self.start_phase(phase, state, handlers) {
            Ok(Started::Suspended(_)) => Ok(true),
            Ok(Started::Ended) => {
                self.current = self.standby.take();
                Ok(true)
            }
            Err(err) => {
                self.current = self.standby.take();
                Err(err)
            }
        }
    }

    /// Report the in-flight phase if it has been running longer than the
    /// configured timeout.
    pub fn check_stall(&self, now: Instant) -> Result<(), SchedulerError> {
        let (Some(timeout), Some(in_flight)) = (self.config.stall_timeout(), &self.current) else {
            return Ok(());
        };
        let elapsed = now.saturating_duration_since(in_flight.started_at);
        if elapsed >= timeout {
            warn!(phase = %in_flight.phase, ?elapsed, "phase stalled");
            return Err(SchedulerError::Stalled {
                kind: in_flight.phase.kind(),
                elapsed,
            });
        }
        Ok(())
    }

    fn start_phase(
        &mut self,
        phase: Phase,
        state: &mut BattleState,
        handlers: &mut PhaseHandlers,
    ) -> Result<Started, SchedulerError> {
        let kind = phase.kind();
        let Some(handler) = handlers.get_mut(kind) else {
            warn!(phase = %phase, "no handler registered");
            return Err(SchedulerError::NoHandler(kind));
        };

        debug!(phase = %phase, "start phase");
        state.record(&phase);
        let mut ctx = PhaseContext::new(state, &mut self.queues);
        match handler.start(&phase, &mut ctx) {
            Ok(PhaseOutcome::Ended) => {
                debug!(phase = %phase, "end phase");
                Ok(Started::Ended)
            }
            Ok(PhaseOutcome::Suspended) => {
                let token = CompletionToken(self.next_token);
                self.next_token += 1;
                debug!(phase = %phase, %token, "phase suspended");
                self.current = Some(InFlight {
                    phase,
                    token,
                    started_at: Instant::now(),
                });
                Ok(Started::Suspended(token))
            }
            Err(source) => {
                warn!(phase = %phase, error = %source, "phase failed");
                Err(SchedulerError::PhaseFailed { kind, source })
            }
        }
    }
}
