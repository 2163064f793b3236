//! Registry of speed-ordered queues, one per dynamic phase kind.
//!
//! When a phase of a dynamic kind is queued, the phase itself goes into the
//! queue for its kind and the main queue receives a marker in its place.
//! Reaching the marker activates the queue.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::{BattlerIndex, FieldView};
use crate::phase::{MoveSlot, Phase, PhaseKind, TimingModifier};

use super::priority::{
    MovePhasePriorityQueue, PokemonPhasePriorityQueue, PriorityQueue, SwitchSummonPriorityQueue,
};

/// What happened to a phase offered to the dynamic queues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    /// Not a dynamic kind; the phase is handed back.
    NotDynamic(Phase),
    /// Absorbed; a marker should take its place.
    Queued,
    /// Refused as a conflict and dropped.
    Rejected,
}

/// Queue backing a single dynamic kind.
#[derive(Clone, Debug)]
pub enum DynamicQueue {
    Move(MovePhasePriorityQueue),
    Switch(SwitchSummonPriorityQueue),
    Pokemon(PokemonPhasePriorityQueue),
}

impl DynamicQueue {
    /// Pick the ordering policy appropriate to `kind`.
    #[must_use]
    pub fn for_kind(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::Move => Self::Move(MovePhasePriorityQueue::new()),
            PhaseKind::Summon | PhaseKind::SwitchSummon => {
                Self::Switch(SwitchSummonPriorityQueue::new())
            }
            _ => Self::Pokemon(PokemonPhasePriorityQueue::new()),
        }
    }

    pub fn push(&mut self, phase: Phase) -> bool {
        match self {
            Self::Move(q) => q.push(phase),
            Self::Switch(q) => q.push(phase),
            Self::Pokemon(q) => q.push(phase),
        }
    }

    pub fn pop(&mut self, field: &dyn FieldView) -> Option<Phase> {
        match self {
            Self::Move(q) => q.pop(field),
            Self::Switch(q) => q.pop(field),
            Self::Pokemon(q) => q.pop(field),
        }
    }

    pub fn clear(&mut self) {
        self.phases_mut().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phases().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases().is_empty()
    }

    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        match self {
            Self::Move(q) => q.items(),
            Self::Switch(q) => q.items(),
            Self::Pokemon(q) => q.items(),
        }
    }

    fn phases_mut(&mut self) -> &mut Vec<Phase> {
        match self {
            Self::Move(q) => q.items_mut(),
            Self::Switch(q) => q.items_mut(),
            Self::Pokemon(q) => q.items_mut(),
        }
    }
}

/// All dynamic queues, keyed by kind.
#[derive(Clone, Debug, Default)]
pub struct DynamicQueueManager {
    queues: FxHashMap<PhaseKind, DynamicQueue>,
}

impl DynamicQueueManager {
    /// Create queues for the given kinds.
    pub fn new(kinds: &[PhaseKind]) -> Self {
        let queues = kinds
            .iter()
            .map(|kind| (*kind, DynamicQueue::for_kind(*kind)))
            .collect();
        Self { queues }
    }

    #[must_use]
    pub fn is_dynamic(&self, kind: PhaseKind) -> bool {
        self.queues.contains_key(&kind)
    }

    /// Offer a phase to the dynamic queues.
    pub fn queue_dynamic_phase(&mut self, phase: Phase) -> Routed {
        let Some(queue) = self.queues.get_mut(&phase.kind()) else {
            return Routed::NotDynamic(phase);
        };
        if queue.push(phase) {
            Routed::Queued
        } else {
            Routed::Rejected
        }
    }

    /// Reorder and pop the next phase of `kind`.
    pub fn pop_next(&mut self, kind: PhaseKind, field: &dyn FieldView) -> Option<Phase> {
        self.queues.get_mut(&kind)?.pop(field)
    }

    #[must_use]
    pub fn has_pending(&self, kind: PhaseKind) -> bool {
        self.queues.get(&kind).is_some_and(|q| !q.is_empty())
    }

    /// Total phases waiting across all dynamic queues.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queues.values().map(DynamicQueue::len).sum()
    }

    #[must_use]
    pub fn queue(&self, kind: PhaseKind) -> Option<&DynamicQueue> {
        self.queues.get(&kind)
    }

    /// Every waiting phase, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.queues.values().flat_map(|q| q.phases().iter())
    }

    #[must_use]
    pub fn find(&self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> Option<&Phase> {
        self.queues
            .get(&kind)?
            .phases()
            .iter()
            .find(|p| predicate(p))
    }

    pub fn find_mut(
        &mut self,
        kind: PhaseKind,
        predicate: impl Fn(&Phase) -> bool,
    ) -> Option<&mut Phase> {
        self.queues
            .get_mut(&kind)?
            .phases_mut()
            .iter_mut()
            .find(|p| predicate(p))
    }

    #[must_use]
    pub fn exists(&self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.find(kind, predicate).is_some()
    }

    /// Remove the first queued phase of `kind` matching `predicate`.
    pub fn remove_phase(&mut self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        let Some(queue) = self.queues.get_mut(&kind) else {
            return false;
        };
        let phases = queue.phases_mut();
        match phases.iter().position(|p| predicate(p)) {
            Some(index) => {
                phases.remove(index);
                true
            }
            None => false,
        }
    }

    // === Move phase surgery ===

    #[must_use]
    pub fn find_move_phase(&self, predicate: impl Fn(&Phase) -> bool) -> Option<&Phase> {
        self.find(PhaseKind::Move, predicate)
    }

    /// Cancel the first matching move. It stays queued but will not start.
    pub fn cancel_move_phase(&mut self, predicate: impl Fn(&Phase) -> bool) -> bool {
        match self.find_mut(PhaseKind::Move, predicate) {
            Some(phase) => {
                phase.cancel();
                true
            }
            None => false,
        }
    }

    /// Force the first matching move into another bracket.
    pub fn set_timing_modifier(
        &mut self,
        predicate: impl Fn(&Phase) -> bool,
        timing: TimingModifier,
    ) -> bool {
        match self.find_mut(PhaseKind::Move, predicate) {
            Some(phase) => {
                phase.args.timing = timing;
                true
            }
            None => false,
        }
    }

    /// Replace the move the first matching phase will use.
    pub fn set_move_for_phase(
        &mut self,
        predicate: impl Fn(&Phase) -> bool,
        move_slot: MoveSlot,
    ) -> bool {
        match self.find_mut(PhaseKind::Move, predicate) {
            Some(phase) => {
                phase.args.move_slot = Some(move_slot);
                true
            }
            None => false,
        }
    }

    /// Retarget queued moves aimed at `removed` onto `ally`.
    ///
    /// Returns how many phases were changed.
    pub fn redirect_moves(&mut self, removed: BattlerIndex, ally: BattlerIndex) -> usize {
        let Some(queue) = self.queues.get_mut(&PhaseKind::Move) else {
            return 0;
        };
        let mut changed = 0;
        for phase in queue.phases_mut() {
            if !phase.args.targets.contains(&removed) {
                continue;
            }
            if phase.battler() == Some(ally) || phase.args.targets.contains(&ally) {
                phase.args.targets.retain(|t| *t != removed);
            } else {
                for target in phase.args.targets.iter_mut() {
                    if *target == removed {
                        *target = ally;
                    }
                }
            }
            changed += 1;
        }
        if changed > 0 {
            debug!(%removed, %ally, changed, "redirected queued moves");
        }
        changed
    }

    /// Empty the queue for `kind`, returning how many phases went.
    pub fn clear_queue(&mut self, kind: PhaseKind) -> usize {
        match self.queues.get_mut(&kind) {
            Some(queue) => {
                let removed = queue.len();
                queue.clear();
                removed
            }
            None => 0,
        }
    }

    /// Empty every dynamic queue.
    pub fn clear_queues(&mut self) {
        for queue in self.queues.values_mut() {
            queue.clear();
        }
    }
}
