//! Speed-ordered priority queues.
//!
//! Items are appended unsorted; every `pop` re-sorts first. Speeds, brackets
//! and field presence can all change between pops (an ability fires, an item
//! is consumed, a battler is forced out), so the order is only trusted at
//! the moment of extraction.

use tracing::debug;

use crate::core::{BattlerIndex, FieldView};
use crate::phase::Phase;

use super::speed::{sort_in_speed_order, OrderKey};

/// A queue that re-sorts itself immediately before each pop.
///
/// Implementors provide storage and the comparison policy (`reorder`);
/// everything else has a default.
pub trait PriorityQueue {
    type Item;

    /// Current contents, in whatever order the last reorder left them.
    fn items(&self) -> &[Self::Item];

    fn items_mut(&mut self) -> &mut Vec<Self::Item>;

    /// Sort the contents according to this queue's policy.
    fn reorder(&mut self, field: &dyn FieldView);

    /// Append an item without sorting.
    ///
    /// Returns `false` if the queue refused it.
    fn push(&mut self, item: Self::Item) -> bool {
        self.items_mut().push(item);
        true
    }

    /// Reorder, then remove and return the front item.
    fn pop(&mut self, field: &dyn FieldView) -> Option<Self::Item> {
        self.reorder(field);
        let items = self.items_mut();
        if items.is_empty() {
            None
        } else {
            Some(items.remove(0))
        }
    }

    /// Drop every item.
    fn clear(&mut self) {
        self.items_mut().clear();
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn len(&self) -> usize {
        self.items().len()
    }

    fn find<P>(&self, predicate: P) -> Option<&Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.items().iter().find(|item| predicate(item))
    }

    fn find_mut<P>(&mut self, predicate: P) -> Option<&mut Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.items_mut().iter_mut().find(|item| predicate(item))
    }

    /// Remove the first item matching `predicate`.
    fn remove_first<P>(&mut self, predicate: P) -> Option<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        let items = self.items_mut();
        let index = items.iter().position(|item| predicate(item))?;
        Some(items.remove(index))
    }
}

/// Battler-tied phases ordered by speed alone.
///
/// The phase's bracket still applies; move priority and speed bypass do not.
#[derive(Clone, Debug, Default)]
pub struct PokemonPhasePriorityQueue {
    phases: Vec<Phase>,
}

impl PokemonPhasePriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriorityQueue for PokemonPhasePriorityQueue {
    type Item = Phase;

    fn items(&self) -> &[Phase] {
        &self.phases
    }

    fn items_mut(&mut self) -> &mut Vec<Phase> {
        &mut self.phases
    }

    fn reorder(&mut self, field: &dyn FieldView) {
        sort_in_speed_order(&mut self.phases, field, |p| {
            OrderKey::for_phase(p, field).speed_only()
        });
    }
}

/// Move phases ordered by bracket, move priority, bypass and speed.
#[derive(Clone, Debug, Default)]
pub struct MovePhasePriorityQueue {
    phases: Vec<Phase>,
}

impl MovePhasePriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriorityQueue for MovePhasePriorityQueue {
    type Item = Phase;

    fn items(&self) -> &[Phase] {
        &self.phases
    }

    fn items_mut(&mut self) -> &mut Vec<Phase> {
        &mut self.phases
    }

    fn reorder(&mut self, field: &dyn FieldView) {
        sort_in_speed_order(&mut self.phases, field, |p| OrderKey::for_phase(p, field));
    }
}

/// Bare battlers in speed order.
///
/// ```
/// use battle_scheduler::core::{BattleState, Battler, BattlerIndex};
/// use battle_scheduler::queue::{PokemonPriorityQueue, PriorityQueue};
///
/// let state = BattleState::new(1)
///     .with_battler(Battler::new(BattlerIndex::PLAYER, 40))
///     .with_battler(Battler::new(BattlerIndex::ENEMY, 70));
///
/// let mut queue = PokemonPriorityQueue::new();
/// queue.push(BattlerIndex::PLAYER);
/// queue.push(BattlerIndex::ENEMY);
/// assert_eq!(queue.pop(&state), Some(BattlerIndex::ENEMY));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PokemonPriorityQueue {
    battlers: Vec<BattlerIndex>,
}

impl PokemonPriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriorityQueue for PokemonPriorityQueue {
    type Item = BattlerIndex;

    fn items(&self) -> &[BattlerIndex] {
        &self.battlers
    }

    fn items_mut(&mut self) -> &mut Vec<BattlerIndex> {
        &mut self.battlers
    }

    fn reorder(&mut self, field: &dyn FieldView) {
        sort_in_speed_order(&mut self.battlers, field, |b| {
            OrderKey::for_battler(*b, field).speed_only()
        });
    }
}

/// Switch-in and summon phases.
///
/// Ordered like [`PokemonPhasePriorityQueue`], but `push` refuses a phase
/// that conflicts with one already pending:
/// - another entry for the same field slot
/// - another entry bringing in the same party member on the same side
#[derive(Clone, Debug, Default)]
pub struct SwitchSummonPriorityQueue {
    phases: Vec<Phase>,
}

impl SwitchSummonPriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `phase` conflicts with a pending entry.
    #[must_use]
    pub fn conflicts(&self, phase: &Phase) -> bool {
        let Some(slot) = phase.battler() else {
            return false;
        };
        self.phases.iter().any(|pending| {
            let Some(pending_slot) = pending.battler() else {
                return false;
            };
            if pending_slot == slot {
                return true;
            }
            pending_slot.side() == slot.side()
                && phase.args.switch_in.is_some()
                && pending.args.switch_in == phase.args.switch_in
        })
    }
}

impl PriorityQueue for SwitchSummonPriorityQueue {
    type Item = Phase;

    fn items(&self) -> &[Phase] {
        &self.phases
    }

    fn items_mut(&mut self) -> &mut Vec<Phase> {
        &mut self.phases
    }

    fn push(&mut self, phase: Phase) -> bool {
        if self.conflicts(&phase) {
            debug!(phase = %phase, "dropping conflicting switch-in");
            return false;
        }
        self.phases.push(phase);
        true
    }

    fn reorder(&mut self, field: &dyn FieldView) {
        sort_in_speed_order(&mut self.phases, field, |p| {
            OrderKey::for_phase(p, field).speed_only()
        });
    }
}
