//! Speed-order algorithm.
//!
//! Produces a total order over battler-tied items. Earlier sorts first:
//!
//! 1. Priority bracket: `First` < `Normal` < `Last`
//! 2. Higher move priority
//! 3. Within equal priority, battlers with a speed bypass (Quick Claw)
//! 4. Battlers still on the field
//! 5. Higher effective speed, or lower when speed is reversed
//! 6. Exact ties: seeded shuffle
//!
//! Ties are resolved by shuffling the candidates with the field's tie-break
//! RNG before a stable sort, so equal keys come out in a random order that
//! is reproducible for a given seed.

use std::cmp::Reverse;

use crate::core::{BattlerIndex, FieldView};
use crate::phase::{Phase, TimingModifier};

/// Everything the comparison looks at for one item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub timing: TimingModifier,
    pub priority: i8,
    pub bypass: bool,
    /// `None` when the battler has left the field.
    pub speed: Option<u32>,
}

impl OrderKey {
    /// Key for a bare battler at normal priority.
    #[must_use]
    pub fn for_battler(battler: BattlerIndex, field: &dyn FieldView) -> Self {
        Self {
            timing: TimingModifier::Normal,
            priority: 0,
            bypass: field.bypass_speed(battler),
            speed: field.effective_speed(battler),
        }
    }

    /// Key for a phase from its battler, bracket and move priority.
    #[must_use]
    pub fn for_phase(phase: &Phase, field: &dyn FieldView) -> Self {
        let (bypass, speed) = match phase.battler() {
            Some(battler) => (field.bypass_speed(battler), field.effective_speed(battler)),
            None => (false, None),
        };
        Self {
            timing: phase.args.timing,
            priority: phase.args.move_slot.map_or(0, |m| m.priority),
            bypass,
            speed,
        }
    }

    /// Same key, ignoring move priority and bypass.
    #[must_use]
    pub fn speed_only(self) -> Self {
        Self {
            priority: 0,
            bypass: false,
            ..self
        }
    }

    fn sort_key(self, reversed: bool) -> (TimingModifier, Reverse<i8>, Reverse<bool>, bool, i64) {
        let speed = self.speed.map_or(0, i64::from);
        let speed_rank = if reversed { speed } else { -speed };
        (
            self.timing,
            Reverse(self.priority),
            Reverse(self.bypass),
            self.speed.is_none(),
            speed_rank,
        )
    }
}

/// Sort `items` in speed order.
///
/// `key` is evaluated once per item.
pub fn sort_in_speed_order<T, F>(items: &mut [T], field: &dyn FieldView, key: F)
where
    F: Fn(&T) -> OrderKey,
{
    if items.len() < 2 {
        return;
    }

    let mut rng = field.tie_break_rng();
    rng.shuffle(items);

    let reversed = field.speed_reversed();
    items.sort_by_cached_key(|item| key(item).sort_key(reversed));
}
