//! Phases: atomic steps of battle resolution.
//!
//! A phase is plain data: a [`PhaseKind`] tag plus a [`PhaseArgs`] payload.
//! Behaviour lives in handlers registered per kind (see [`PhaseHandlers`]),
//! so adding a step never means extending a base type.
//!
//! ## Lifecycle
//!
//! 1. Constructed with whatever arguments its kind needs
//! 2. Pushed or unshifted into the manager's queues
//! 3. Started by the manager when popped
//! 4. Discarded once its handler reports it ended
//!
//! ```
//! use battle_scheduler::core::BattlerIndex;
//! use battle_scheduler::phase::{MoveSlot, Phase, PhaseKind};
//!
//! let phase = Phase::move_use(BattlerIndex::PLAYER, MoveSlot::new(33, 0), [BattlerIndex::ENEMY]);
//! assert!(phase.is(PhaseKind::Move));
//! assert_eq!(phase.battler(), Some(BattlerIndex::PLAYER));
//! ```

mod handler;
mod kind;

pub use handler::{PhaseContext, PhaseHandler, PhaseHandlers, PhaseOutcome};
pub use kind::PhaseKind;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::BattlerIndex;

/// Coarse priority tier. Overrides move priority and speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimingModifier {
    /// Forced to act next (After You, Instruct).
    First,
    #[default]
    Normal,
    /// Forced to act last (Quash).
    Last,
}

/// How a battler leaves or enters the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchType {
    #[default]
    Switch,
    BatonPass,
    ShedTail,
    /// Start-of-battle send out.
    Initial,
}

/// The move a phase uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveSlot {
    /// Opaque move identifier owned by the move data layer.
    pub id: u16,
    /// In-bracket priority (-7..=5 in the main series).
    pub priority: i8,
}

impl MoveSlot {
    #[must_use]
    pub const fn new(id: u16, priority: i8) -> Self {
        Self { id, priority }
    }
}

/// Payload of a phase.
///
/// Every field is optional; each kind reads the ones it needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseArgs {
    /// Battler this phase concerns.
    pub battler: Option<BattlerIndex>,

    /// Move targets.
    pub targets: SmallVec<[BattlerIndex; 4]>,

    /// Move being used.
    pub move_slot: Option<MoveSlot>,

    /// Priority bracket.
    pub timing: TimingModifier,

    pub switch_type: Option<SwitchType>,

    /// Party member to bring in. `None` lets the summon step ask.
    pub switch_in: Option<u8>,

    /// Text for message phases.
    pub message: Option<String>,

    /// For markers: the dynamic kind to activate.
    pub deferred_kind: Option<PhaseKind>,

    /// For turn end: the next wave crosses a biome boundary.
    pub upcoming_interlude: bool,
}

impl PhaseArgs {
    /// Arguments naming only a battler.
    #[must_use]
    pub fn battler(battler: BattlerIndex) -> Self {
        Self {
            battler: Some(battler),
            ..Self::default()
        }
    }
}

/// A unit of battle resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    kind: PhaseKind,

    /// Arguments for the handler.
    pub args: PhaseArgs,

    cancelled: bool,
}

impl Phase {
    /// Create a phase with no arguments.
    #[must_use]
    pub fn new(kind: PhaseKind) -> Self {
        Self::with_args(kind, PhaseArgs::default())
    }

    #[must_use]
    pub fn with_args(kind: PhaseKind, args: PhaseArgs) -> Self {
        Self {
            kind,
            args,
            cancelled: false,
        }
    }

    /// Create a phase tied to a battler.
    #[must_use]
    pub fn for_battler(kind: PhaseKind, battler: BattlerIndex) -> Self {
        Self::with_args(kind, PhaseArgs::battler(battler))
    }

    /// Create a move-use phase.
    #[must_use]
    pub fn move_use(
        battler: BattlerIndex,
        move_slot: MoveSlot,
        targets: impl IntoIterator<Item = BattlerIndex>,
    ) -> Self {
        Self::with_args(
            PhaseKind::Move,
            PhaseArgs {
                battler: Some(battler),
                move_slot: Some(move_slot),
                targets: targets.into_iter().collect(),
                ..PhaseArgs::default()
            },
        )
    }

    /// Create a message phase.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::with_args(
            PhaseKind::Message,
            PhaseArgs {
                message: Some(text.into()),
                ..PhaseArgs::default()
            },
        )
    }

    /// Placeholder that activates the speed-ordered queue for `kind`.
    #[must_use]
    pub fn marker(kind: PhaseKind) -> Self {
        Self::with_args(
            PhaseKind::DynamicMarker,
            PhaseArgs {
                deferred_kind: Some(kind),
                ..PhaseArgs::default()
            },
        )
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingModifier) -> Self {
        self.args.timing = timing;
        self
    }

    #[must_use]
    pub fn with_switch(mut self, switch_type: SwitchType, switch_in: Option<u8>) -> Self {
        self.args.switch_type = Some(switch_type);
        self.args.switch_in = switch_in;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> PhaseKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[must_use]
    pub fn is(&self, kind: PhaseKind) -> bool {
        self.kind == kind
    }

    /// Battler this phase concerns, if any.
    #[must_use]
    pub fn battler(&self) -> Option<BattlerIndex> {
        self.args.battler
    }

    /// For markers: the kind whose queue this marker activates.
    #[must_use]
    pub fn marker_kind(&self) -> Option<PhaseKind> {
        if self.kind == PhaseKind::DynamicMarker {
            self.args.deferred_kind
        } else {
            None
        }
    }

    /// Mark this phase so the manager discards it instead of starting it.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.marker_kind(), self.args.battler) {
            (Some(kind), _) => write!(f, "{}({})", self.kind, kind),
            (None, Some(battler)) => write!(f, "{}({})", self.kind, battler),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker() {
        let marker = Phase::marker(PhaseKind::Move);
        assert!(marker.is(PhaseKind::DynamicMarker));
        assert_eq!(marker.marker_kind(), Some(PhaseKind::Move));
        assert_eq!(marker.battler(), None);

        // Only markers report a deferred kind
        let mut not_marker = Phase::new(PhaseKind::Berry);
        not_marker.args.deferred_kind = Some(PhaseKind::Move);
        assert_eq!(not_marker.marker_kind(), None);
    }

    #[test]
    fn test_move_use() {
        let phase = Phase::move_use(
            BattlerIndex::ENEMY,
            MoveSlot::new(98, 1),
            [BattlerIndex::PLAYER, BattlerIndex::PLAYER_2],
        );
        assert_eq!(phase.args.move_slot, Some(MoveSlot::new(98, 1)));
        assert_eq!(phase.args.targets.len(), 2);
        assert_eq!(phase.args.timing, TimingModifier::Normal);
    }

    #[test]
    fn test_cancel() {
        let mut phase = Phase::for_battler(PhaseKind::Move, BattlerIndex::PLAYER);
        assert!(!phase.is_cancelled());
        phase.cancel();
        assert!(phase.is_cancelled());
    }

    #[test]
    fn test_timing_order() {
        assert!(TimingModifier::First < TimingModifier::Normal);
        assert!(TimingModifier::Normal < TimingModifier::Last);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Phase::new(PhaseKind::Berry)), "BerryPhase");
        assert_eq!(
            format!("{}", Phase::for_battler(PhaseKind::Faint, BattlerIndex::ENEMY)),
            "FaintPhase(Battler(2))"
        );
        assert_eq!(
            format!("{}", Phase::marker(PhaseKind::Move)),
            "DynamicPhaseMarker(MovePhase)"
        );
    }
}
