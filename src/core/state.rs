//! Battle state: the explicit context every phase runs against.
//!
//! ## BattleState
//!
//! Everything the scheduler and its handlers read or write:
//! - Field battlers and their resolved speed
//! - Turn, wave and the wave seed used for tie-breaks
//! - Field-wide speed reversal (Trick Room)
//! - Commands chosen for the current turn
//! - A history of started phases
//!
//! The state is passed into the manager and on into each handler; there is
//! no ambient global. Cloning is cheap, so two battles can be simulated side
//! by side without cross-talk.
//!
//! ## FieldView
//!
//! The read-only slice of state the speed-order algorithm consumes.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::battler::{Battler, BattlerIndex, FieldMap};
use super::rng::GameRng;
use crate::battle::TurnCommand;
use crate::phase::{Phase, PhaseKind};
use crate::queue::{PokemonPriorityQueue, PriorityQueue};

/// Read access to the field for speed ordering.
pub trait FieldView {
    /// Speed after modifiers, or `None` if the slot is empty or fainted.
    fn effective_speed(&self, battler: BattlerIndex) -> Option<u32>;

    /// Acts first within its priority bracket this turn.
    fn bypass_speed(&self, battler: BattlerIndex) -> bool;

    /// Slower battlers act first (Trick Room).
    fn speed_reversed(&self) -> bool;

    /// Fresh RNG used to break speed ties.
    ///
    /// Must be derived, not advanced: calling it twice without a state change
    /// returns identical streams.
    fn tie_break_rng(&self) -> GameRng;
}

/// One started phase, as recorded in [`BattleState::history`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub kind: PhaseKind,
    pub battler: Option<BattlerIndex>,
    pub message: Option<String>,
}

impl From<&Phase> for PhaseRecord {
    fn from(phase: &Phase) -> Self {
        Self {
            kind: phase.kind(),
            battler: phase.battler(),
            message: phase.args.message.clone(),
        }
    }
}

/// Complete transient battle state.
#[derive(Clone, Debug)]
pub struct BattleState {
    battlers: FieldMap<Option<Battler>>,

    /// Double battle (four slots in use).
    pub double: bool,

    /// Turn number (starts at 0, incremented by the turn-init step).
    pub turn: u32,

    /// Wave number within the run.
    pub wave: u32,

    /// Seed for this wave; tie-breaks derive from it.
    pub wave_seed: u64,

    /// Speed order is inverted.
    pub trick_room: bool,

    /// General-purpose battle RNG for handlers.
    pub rng: GameRng,

    /// Failed escapes this battle; each one raises the next escape chance.
    pub escape_attempts: u32,

    /// Commands chosen for this turn.
    pub commands: FieldMap<Option<TurnCommand>>,

    history: Vector<PhaseRecord>,
}

impl BattleState {
    /// Create an empty singles battle.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            battlers: FieldMap::with_default(),
            double: false,
            turn: 0,
            wave: 1,
            wave_seed: seed,
            trick_room: false,
            rng: GameRng::new(seed),
            escape_attempts: 0,
            commands: FieldMap::with_default(),
            history: Vector::new(),
        }
    }

    /// Create an empty double battle.
    #[must_use]
    pub fn new_double(seed: u64) -> Self {
        Self {
            double: true,
            ..Self::new(seed)
        }
    }

    /// Place a battler in its slot (builder pattern).
    #[must_use]
    pub fn with_battler(mut self, battler: Battler) -> Self {
        self.set_battler(battler);
        self
    }

    /// Place a battler in its slot, replacing any occupant.
    pub fn set_battler(&mut self, battler: Battler) {
        let index = battler.index;
        if let Some(slot) = self.battlers.get_mut(index) {
            *slot = Some(battler);
        }
    }

    /// Empty a slot.
    pub fn remove_battler(&mut self, index: BattlerIndex) -> Option<Battler> {
        self.battlers.get_mut(index).and_then(Option::take)
    }

    #[must_use]
    pub fn battler(&self, index: BattlerIndex) -> Option<&Battler> {
        self.battlers.get(index).and_then(Option::as_ref)
    }

    pub fn battler_mut(&mut self, index: BattlerIndex) -> Option<&mut Battler> {
        self.battlers.get_mut(index).and_then(Option::as_mut)
    }

    /// Whether the battler in `index` can still act.
    #[must_use]
    pub fn is_on_field(&self, index: BattlerIndex) -> bool {
        self.battler(index).is_some_and(Battler::is_on_field)
    }

    /// Battlers on the field, in slot order.
    pub fn active_battlers(&self) -> impl Iterator<Item = &Battler> {
        BattlerIndex::all(self.double)
            .filter_map(|index| self.battler(index))
            .filter(|b| b.is_on_field())
    }

    /// Active battlers in speed order, for field-wide effects.
    #[must_use]
    pub fn speed_ordered_battlers(&self) -> Vec<BattlerIndex> {
        let mut queue = PokemonPriorityQueue::new();
        for battler in self.active_battlers() {
            queue.push(battler.index);
        }
        let mut ordered = Vec::with_capacity(queue.len());
        while let Some(index) = queue.pop(self) {
            ordered.push(index);
        }
        ordered
    }

    #[must_use]
    pub fn command(&self, index: BattlerIndex) -> Option<&TurnCommand> {
        self.commands.get(index).and_then(Option::as_ref)
    }

    pub fn set_command(&mut self, index: BattlerIndex, command: TurnCommand) {
        if let Some(slot) = self.commands.get_mut(index) {
            *slot = Some(command);
        }
    }

    pub fn clear_commands(&mut self) {
        for (_, command) in self.commands.iter_mut() {
            *command = None;
        }
    }

    /// Record a started phase.
    pub fn record(&mut self, phase: &Phase) {
        self.history.push_back(PhaseRecord::from(phase));
    }

    /// Phases started so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<PhaseRecord> {
        &self.history
    }

    /// Kinds of phases started so far, oldest first.
    #[must_use]
    pub fn history_kinds(&self) -> Vec<PhaseKind> {
        self.history.iter().map(|r| r.kind).collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl FieldView for BattleState {
    fn effective_speed(&self, battler: BattlerIndex) -> Option<u32> {
        self.battler(battler)
            .filter(|b| b.is_on_field())
            .map(|b| b.effective_speed)
    }

    fn bypass_speed(&self, battler: BattlerIndex) -> bool {
        self.battler(battler).is_some_and(|b| b.bypass_speed)
    }

    fn speed_reversed(&self) -> bool {
        self.trick_room
    }

    fn tie_break_rng(&self) -> GameRng {
        GameRng::new(self.wave_seed).with_offset(u64::from(self.turn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singles(player_speed: u32, enemy_speed: u32) -> BattleState {
        BattleState::new(42)
            .with_battler(Battler::new(BattlerIndex::PLAYER, player_speed))
            .with_battler(Battler::new(BattlerIndex::ENEMY, enemy_speed))
    }

    #[test]
    fn test_new_state() {
        let state = BattleState::new(7);
        assert!(!state.double);
        assert_eq!(state.turn, 0);
        assert_eq!(state.active_battlers().count(), 0);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_battler_access() {
        let mut state = singles(80, 60);
        assert!(state.is_on_field(BattlerIndex::ENEMY));
        assert!(!state.is_on_field(BattlerIndex::PLAYER_2));

        state.battler_mut(BattlerIndex::ENEMY).unwrap().hp = 0;
        assert!(!state.is_on_field(BattlerIndex::ENEMY));
        assert_eq!(state.effective_speed(BattlerIndex::ENEMY), None);

        let removed = state.remove_battler(BattlerIndex::PLAYER);
        assert_eq!(removed.map(|b| b.effective_speed), Some(80));
        assert!(state.battler(BattlerIndex::PLAYER).is_none());
    }

    #[test]
    fn test_singles_ignores_second_slots() {
        let state = BattleState::new(1)
            .with_battler(Battler::new(BattlerIndex::PLAYER, 10))
            .with_battler(Battler::new(BattlerIndex::PLAYER_2, 20));
        assert_eq!(state.active_battlers().count(), 1);
    }

    #[test]
    fn test_speed_ordered_battlers() {
        let state = singles(50, 120);
        assert_eq!(
            state.speed_ordered_battlers(),
            vec![BattlerIndex::ENEMY, BattlerIndex::PLAYER]
        );

        let mut reversed = singles(50, 120);
        reversed.trick_room = true;
        assert_eq!(
            reversed.speed_ordered_battlers(),
            vec![BattlerIndex::PLAYER, BattlerIndex::ENEMY]
        );
    }

    #[test]
    fn test_tie_break_rng_is_derived() {
        let state = singles(50, 50);
        let mut a = state.tie_break_rng();
        let mut b = state.tie_break_rng();
        assert_eq!(a.gen_range(0..1_000_000), b.gen_range(0..1_000_000));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = singles(50, 60);
        let mut copy = original.clone();
        copy.battler_mut(BattlerIndex::PLAYER).unwrap().effective_speed = 999;
        copy.record(&Phase::new(PhaseKind::Berry));

        assert_eq!(original.effective_speed(BattlerIndex::PLAYER), Some(50));
        assert!(original.history().is_empty());
        assert_eq!(copy.history_kinds(), vec![PhaseKind::Berry]);
    }

    #[test]
    fn test_commands() {
        let mut state = singles(50, 60);
        state.set_command(BattlerIndex::PLAYER, TurnCommand::Run);
        assert_eq!(state.command(BattlerIndex::PLAYER), Some(&TurnCommand::Run));

        state.clear_commands();
        assert!(state.command(BattlerIndex::PLAYER).is_none());
    }
}
