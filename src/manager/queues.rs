//! Queue operations available to running phases.
//!
//! [`PhaseQueues`] owns the main tree and the dynamic queues. Handlers get
//! it through their context; the manager uses the same value to pick what
//! runs next.

use tracing::{debug, trace};

use crate::core::{BattlerIndex, FieldView, SchedulerConfig, SchedulerError};
use crate::phase::{MoveSlot, Phase, PhaseArgs, PhaseKind, SwitchType, TimingModifier};
use crate::queue::{DynamicQueueManager, PhaseTree, Routed};

/// When a switch-out sequence runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SwitchOutTiming {
    /// Right after the current phase.
    #[default]
    Eager,
    /// After everything the current phase queued has resolved.
    Deferred,
}

/// When an entrance sequence runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntranceTiming {
    /// Right after the current phase.
    #[default]
    Eager,
    /// At the back of the battle.
    Delayed,
}

/// Options for [`PhaseQueues::queue_battler_switch_out`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwitchOutParams {
    pub switch_type: SwitchType,
    /// Party member to send in. `None` asks during the summon.
    pub switch_in: Option<u8>,
    pub when: SwitchOutTiming,
}

/// Options for [`PhaseQueues::queue_battler_entrance`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntranceParams {
    pub switch_type: SwitchType,
    pub switch_in: Option<u8>,
    /// Offer the player a switch after the entrance. Defaults to true for
    /// player slots; not allowed for enemy slots.
    pub check_switch: Option<bool>,
    pub when: EntranceTiming,
}

/// A dynamic queue being drained, and the tree level its phases' follow-ups
/// belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DrainState {
    kind: PhaseKind,
    level: usize,
}

/// Main tree plus dynamic queues.
#[derive(Clone, Debug)]
pub struct PhaseQueues {
    tree: PhaseTree,
    dynamic: DynamicQueueManager,
    draining: Vec<DrainState>,
    turn_end_phases: Vec<PhaseKind>,
    interlude_removals: Vec<PhaseKind>,
}

impl PhaseQueues {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            tree: PhaseTree::new(),
            dynamic: DynamicQueueManager::new(&config.dynamic_kinds),
            draining: Vec::new(),
            turn_end_phases: config.turn_end_phases.clone(),
            interlude_removals: config.interlude_removals.clone(),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &PhaseTree {
        &self.tree
    }

    #[must_use]
    pub fn dynamic(&self) -> &DynamicQueueManager {
        &self.dynamic
    }

    /// Direct access to the dynamic queues. Phases queued this way get no
    /// marker; one must be placed with [`push_phase`](Self::push_phase) or
    /// [`start_dynamic_phase_type`](Self::start_dynamic_phase_type).
    pub fn dynamic_mut(&mut self) -> &mut DynamicQueueManager {
        &mut self.dynamic
    }

    /// Nothing left in the tree or in any dynamic queue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.dynamic.pending_len() == 0
    }

    /// Dynamic kind currently being drained, innermost first.
    #[must_use]
    pub fn draining_kind(&self) -> Option<PhaseKind> {
        self.draining.last().map(|d| d.kind)
    }

    // === Enqueueing ===

    #[must_use]
    pub fn create(&self, kind: PhaseKind, args: PhaseArgs) -> Phase {
        Phase::with_args(kind, args)
    }

    /// Queue at the back of the battle.
    pub fn push_phase(&mut self, phase: Phase) {
        if let Some(phase) = self.route(phase) {
            self.tree.push(phase);
        }
    }

    /// Queue to run right after the current phase, behind anything it has
    /// already unshifted. Move phases go after the next queued move end.
    pub fn unshift_phase(&mut self, phase: Phase) {
        let is_move = phase.is(PhaseKind::Move);
        let Some(phase) = self.route(phase) else {
            return;
        };
        if is_move {
            self.tree.add_after(phase, PhaseKind::MoveEnd);
        } else {
            self.tree.add(phase, false);
        }
    }

    pub fn push_new(&mut self, kind: PhaseKind, args: PhaseArgs) {
        let phase = self.create(kind, args);
        self.push_phase(phase);
    }

    pub fn unshift_new(&mut self, kind: PhaseKind, args: PhaseArgs) {
        let phase = self.create(kind, args);
        self.unshift_phase(phase);
    }

    /// Queue a message, after the current phase or with `defer` at the back.
    pub fn queue_message(&mut self, text: impl Into<String>, defer: bool) {
        let phase = Phase::message(text);
        if defer {
            self.push_phase(phase);
        } else {
            self.unshift_phase(phase);
        }
    }

    pub fn queue_ability_display(&mut self, battler: BattlerIndex, show: bool) {
        let phase = if show {
            Phase::for_battler(PhaseKind::ShowAbility, battler)
        } else {
            Phase::new(PhaseKind::HideAbility)
        };
        self.unshift_phase(phase);
    }

    /// Queue a faint once the effects around it have settled.
    pub fn queue_faint_phase(&mut self, battler: BattlerIndex) {
        self.tree
            .add(Phase::for_battler(PhaseKind::Faint, battler), true);
    }

    /// Queue recall, switch, summon and post-summon for `battler`.
    ///
    /// The four phases run back to back, whatever else is queued for other
    /// battlers.
    pub fn queue_battler_switch_out(&mut self, battler: BattlerIndex, params: SwitchOutParams) {
        let phases = [
            Phase::for_battler(PhaseKind::Recall, battler).with_switch(params.switch_type, None),
            Phase::for_battler(PhaseKind::Switch, battler)
                .with_switch(params.switch_type, params.switch_in),
            Phase::for_battler(PhaseKind::Summon, battler)
                .with_switch(params.switch_type, params.switch_in),
            Phase::for_battler(PhaseKind::PostSummon, battler),
        ];
        // The sequence belongs to one battler, so it skips the dynamic queues
        let defer = params.when == SwitchOutTiming::Deferred;
        for phase in phases {
            self.tree.add(phase, defer);
        }
    }

    /// Queue summon plus check-switch (or post-summon) for `battler`, back to
    /// back.
    pub fn queue_battler_entrance(
        &mut self,
        battler: BattlerIndex,
        params: EntranceParams,
    ) -> Result<(), SchedulerError> {
        let check_switch = params.check_switch.unwrap_or(!battler.is_enemy());
        if check_switch && battler.is_enemy() {
            return Err(SchedulerError::InvalidEnqueue {
                kind: PhaseKind::CheckSwitch,
                reason: format!("{battler} is an enemy slot"),
            });
        }

        let follow_up = if check_switch {
            PhaseKind::CheckSwitch
        } else {
            PhaseKind::PostSummon
        };
        let phases = [
            Phase::for_battler(PhaseKind::Summon, battler)
                .with_switch(params.switch_type, params.switch_in),
            Phase::for_battler(follow_up, battler),
        ];
        for phase in phases {
            match params.when {
                EntranceTiming::Eager => self.tree.add(phase, false),
                EntranceTiming::Delayed => self.tree.push(phase),
            }
        }
        Ok(())
    }

    /// Append the configured end-of-turn phases.
    pub fn queue_turn_end_phases(&mut self) {
        for kind in self.turn_end_phases.clone() {
            self.push_phase(Phase::new(kind));
        }
    }

    /// Drain the queue for `kind` as soon as the current phase ends.
    pub fn start_dynamic_phase_type(&mut self, kind: PhaseKind) {
        self.tree.add(Phase::marker(kind), false);
    }

    // === Lookup and removal ===

    /// First queued phase matching `predicate`, tree first.
    pub fn find_phase(&self, predicate: impl Fn(&Phase) -> bool) -> Option<&Phase> {
        self.tree
            .find(&predicate)
            .or_else(|| self.dynamic.iter().find(|p| predicate(p)))
    }

    #[must_use]
    pub fn has_phase_of_kind(&self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.dynamic.exists(kind, &predicate) || self.tree.exists(kind, &predicate)
    }

    /// Remove the first queued phase of `kind` matching `predicate`.
    pub fn try_remove_phase(&mut self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.dynamic.remove_phase(kind, &predicate) || self.tree.remove(kind, &predicate)
    }

    /// Remove every phase of `kind`, along with its markers and its dynamic
    /// queue. Markers are not counted.
    pub fn remove_all_phases_of_kind(&mut self, kind: PhaseKind) -> usize {
        self.tree
            .remove_all_matching(|p| p.marker_kind() == Some(kind));
        let removed = self.tree.remove_all(kind) + self.dynamic.clear_queue(kind);
        trace!(%kind, removed, "removed phases");
        removed
    }

    pub fn try_replace_phase(&mut self, predicate: impl Fn(&Phase) -> bool, phase: Phase) -> bool {
        self.tree.replace(predicate, phase)
    }

    // === Move phase surgery ===

    #[must_use]
    pub fn get_move_phase(&self, predicate: impl Fn(&Phase) -> bool) -> Option<&Phase> {
        self.dynamic.find_move_phase(predicate)
    }

    pub fn cancel_move(&mut self, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.dynamic.cancel_move_phase(predicate)
    }

    pub fn force_move_next(&mut self, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.dynamic
            .set_timing_modifier(predicate, TimingModifier::First)
    }

    pub fn force_move_last(&mut self, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.dynamic
            .set_timing_modifier(predicate, TimingModifier::Last)
    }

    pub fn change_phase_move(&mut self, predicate: impl Fn(&Phase) -> bool, move_slot: MoveSlot) -> bool {
        self.dynamic.set_move_for_phase(predicate, move_slot)
    }

    pub fn redirect_moves(&mut self, removed: BattlerIndex, ally: BattlerIndex) -> usize {
        self.dynamic.redirect_moves(removed, ally)
    }

    // === Lifecycle ===

    /// Drop end-of-turn effects ahead of a biome transition and flag the
    /// turn end.
    pub fn on_interlude(&mut self) {
        for kind in self.interlude_removals.clone() {
            self.tree.remove_all(kind);
        }
        if let Some(turn_end) = self.tree.find_mut(|p| p.is(PhaseKind::TurnEnd)) {
            turn_end.args.upcoming_interlude = true;
        }
        debug!("interlude: end-of-turn effects dropped");
    }

    /// Empty the tree. With `leave_unshifted`, the current phase's
    /// follow-ups survive.
    pub fn clear_phase_queue(&mut self, leave_unshifted: bool) {
        self.tree.clear(leave_unshifted);
        self.draining.clear();
    }

    /// Empty the tree and every dynamic queue.
    pub fn clear_all(&mut self) {
        self.clear_phase_queue(false);
        self.dynamic.clear_queues();
    }

    /// Empty the dynamic queues only.
    pub fn clear_dynamic(&mut self) {
        self.dynamic.clear_queues();
        self.draining.clear();
    }

    // === Scheduling ===

    /// Choose and remove the next phase to start.
    ///
    /// Follow-ups of a phase from a draining dynamic queue come first, then
    /// the rest of that queue, then the tree. A marker activates its queue;
    /// a marker whose queue is empty, or already draining, is skipped.
    pub fn next_phase(&mut self, field: &dyn FieldView) -> Option<Phase> {
        loop {
            if let Some(drain) = self.draining.last().copied() {
                if !self.tree.has_pending_from(drain.level) {
                    if let Some(phase) = self.dynamic.pop_next(drain.kind, field) {
                        self.tree.open_level_at(drain.level);
                        return Some(phase);
                    }
                    debug!(kind = %drain.kind, "dynamic queue drained");
                    self.draining.pop();
                    continue;
                }
            }

            let phase = self.tree.next_phase()?;
            let Some(kind) = phase.marker_kind() else {
                return Some(phase);
            };
            let already_draining = self.draining.iter().any(|d| d.kind == kind);
            if already_draining || !self.dynamic.has_pending(kind) {
                trace!(%kind, "skipping marker");
                continue;
            }
            debug!(%kind, "draining dynamic queue");
            self.draining.push(DrainState {
                kind,
                level: self.tree.top(),
            });
        }
    }

    /// Offer `phase` to the dynamic queues; returns what the tree should hold.
    fn route(&mut self, phase: Phase) -> Option<Phase> {
        let kind = phase.kind();
        match self.dynamic.queue_dynamic_phase(phase) {
            Routed::NotDynamic(phase) => Some(phase),
            Routed::Queued => Some(Phase::marker(kind)),
            Routed::Rejected => None,
        }
    }
}
