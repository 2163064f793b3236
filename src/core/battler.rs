//! Battler identification and per-slot data storage.
//!
//! ## BattlerIndex
//!
//! Field slot identifier. Slots 0-1 belong to the player side, 2-3 to the
//! enemy side. Singles battles only use slots 0 and 2.
//!
//! ## FieldMap
//!
//! Per-slot storage backed by `Vec` for O(1) access, indexed by
//! `BattlerIndex`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of field slots in a double battle.
pub const FIELD_SLOTS: usize = 4;

/// Which side of the field a battler fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlerSide {
    Player,
    Enemy,
}

/// Field slot of a battler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BattlerIndex(pub u8);

impl BattlerIndex {
    pub const PLAYER: Self = Self(0);
    pub const PLAYER_2: Self = Self(1);
    pub const ENEMY: Self = Self(2);
    pub const ENEMY_2: Self = Self(3);

    /// Create a new battler index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the raw slot (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Side this slot belongs to.
    #[must_use]
    pub const fn side(self) -> BattlerSide {
        if self.0 >= 2 {
            BattlerSide::Enemy
        } else {
            BattlerSide::Player
        }
    }

    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self.side(), BattlerSide::Enemy)
    }

    /// Position within the side (0 = left, 1 = right).
    #[must_use]
    pub const fn field_index(self) -> u8 {
        self.0 % 2
    }

    /// The partner slot on the same side.
    #[must_use]
    pub const fn ally(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Slots in use for a battle.
    ///
    /// ```
    /// use battle_scheduler::core::BattlerIndex;
    ///
    /// let singles: Vec<_> = BattlerIndex::all(false).collect();
    /// assert_eq!(singles, vec![BattlerIndex::PLAYER, BattlerIndex::ENEMY]);
    ///
    /// assert_eq!(BattlerIndex::all(true).count(), 4);
    /// ```
    pub fn all(double: bool) -> impl Iterator<Item = BattlerIndex> {
        (0..FIELD_SLOTS as u8)
            .map(BattlerIndex)
            .filter(move |b| double || b.field_index() == 0)
    }
}

impl std::fmt::Display for BattlerIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Battler({})", self.0)
    }
}

/// Scheduler-visible projection of a combatant on the field.
///
/// The battle-data layer resolves stat stages, paralysis, held items and the
/// like into `effective_speed` before the scheduler reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battler {
    /// Slot occupied.
    pub index: BattlerIndex,

    /// Party member occupying the slot.
    pub party_slot: u8,

    /// Speed after all modifiers.
    pub effective_speed: u32,

    /// Remaining hit points. Zero means fainted.
    pub hp: u32,

    /// Still on the field and able to act.
    pub active: bool,

    /// Moves first within its priority bracket this turn (Quick Claw, Quick Draw).
    pub bypass_speed: bool,

    /// Has a status that ticks at end of turn (poison, burn).
    pub post_turn_status: bool,
}

impl Battler {
    /// Create an active battler with the given speed.
    pub fn new(index: BattlerIndex, effective_speed: u32) -> Self {
        Self {
            index,
            party_slot: index.field_index(),
            effective_speed,
            hp: 100,
            active: true,
            bypass_speed: false,
            post_turn_status: false,
        }
    }

    #[must_use]
    pub fn with_party_slot(mut self, slot: u8) -> Self {
        self.party_slot = slot;
        self
    }

    #[must_use]
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp;
        self
    }

    #[must_use]
    pub fn with_bypass_speed(mut self) -> Self {
        self.bypass_speed = true;
        self
    }

    #[must_use]
    pub fn with_post_turn_status(mut self) -> Self {
        self.post_turn_status = true;
        self
    }

    /// On the field and not fainted.
    #[must_use]
    pub fn is_on_field(&self) -> bool {
        self.active && self.hp > 0
    }
}

/// Per-slot data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use battle_scheduler::core::{BattlerIndex, FieldMap};
///
/// let mut speed: FieldMap<u32> = FieldMap::with_value(0);
/// speed[BattlerIndex::ENEMY] = 90;
/// assert_eq!(speed[BattlerIndex::ENEMY], 90);
/// assert_eq!(speed[BattlerIndex::PLAYER], 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMap<T> {
    data: Vec<T>,
}

impl<T> FieldMap<T> {
    /// Create a new FieldMap with values from a factory function.
    pub fn new(factory: impl Fn(BattlerIndex) -> T) -> Self {
        let data = (0..FIELD_SLOTS as u8)
            .map(|i| factory(BattlerIndex(i)))
            .collect();

        Self { data }
    }

    /// Create a new FieldMap with all entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Create a new FieldMap with default values.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|_| T::default())
    }

    #[must_use]
    pub fn get(&self, index: BattlerIndex) -> Option<&T> {
        self.data.get(index.index())
    }

    pub fn get_mut(&mut self, index: BattlerIndex) -> Option<&mut T> {
        self.data.get_mut(index.index())
    }

    /// Iterate over (BattlerIndex, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (BattlerIndex, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (BattlerIndex(i as u8), v))
    }

    /// Iterate over (BattlerIndex, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BattlerIndex, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (BattlerIndex(i as u8), v))
    }
}

impl<T> Index<BattlerIndex> for FieldMap<T> {
    type Output = T;

    fn index(&self, index: BattlerIndex) -> &Self::Output {
        &self.data[index.index()]
    }
}

impl<T> IndexMut<BattlerIndex> for FieldMap<T> {
    fn index_mut(&mut self, index: BattlerIndex) -> &mut Self::Output {
        &mut self.data[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battler_index_sides() {
        assert_eq!(BattlerIndex::PLAYER.side(), BattlerSide::Player);
        assert_eq!(BattlerIndex::PLAYER_2.side(), BattlerSide::Player);
        assert_eq!(BattlerIndex::ENEMY.side(), BattlerSide::Enemy);
        assert!(BattlerIndex::ENEMY_2.is_enemy());
        assert!(!BattlerIndex::PLAYER.is_enemy());
    }

    #[test]
    fn test_battler_index_ally() {
        assert_eq!(BattlerIndex::PLAYER.ally(), BattlerIndex::PLAYER_2);
        assert_eq!(BattlerIndex::ENEMY_2.ally(), BattlerIndex::ENEMY);
        assert_eq!(BattlerIndex::ENEMY.field_index(), 0);
        assert_eq!(BattlerIndex::ENEMY_2.field_index(), 1);
    }

    #[test]
    fn test_battler_index_display() {
        assert_eq!(format!("{}", BattlerIndex::ENEMY), "Battler(2)");
    }

    #[test]
    fn test_battler_on_field() {
        let b = Battler::new(BattlerIndex::PLAYER, 50);
        assert!(b.is_on_field());

        let fainted = Battler::new(BattlerIndex::PLAYER, 50).with_hp(0);
        assert!(!fainted.is_on_field());
    }

    #[test]
    fn test_field_map_new() {
        let map: FieldMap<u32> = FieldMap::new(|b| b.index() as u32 * 10);

        assert_eq!(map[BattlerIndex::PLAYER], 0);
        assert_eq!(map[BattlerIndex::PLAYER_2], 10);
        assert_eq!(map[BattlerIndex::ENEMY], 20);
        assert_eq!(map[BattlerIndex::ENEMY_2], 30);
    }

    #[test]
    fn test_field_map_out_of_range() {
        let map: FieldMap<u32> = FieldMap::with_default();
        assert!(map.get(BattlerIndex::new(9)).is_none());
    }

    #[test]
    fn test_field_map_iter() {
        let map: FieldMap<Option<u8>> = FieldMap::with_default();
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs.len(), FIELD_SLOTS);
        assert_eq!(pairs[2], (BattlerIndex::ENEMY, &None));
    }

    #[test]
    fn test_field_map_serialization() {
        let map: FieldMap<u32> = FieldMap::new(|b| b.index() as u32 + 1);
        let json = serde_json::to_string(&map).unwrap();
        let deserialized: FieldMap<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, deserialized);
    }
}
