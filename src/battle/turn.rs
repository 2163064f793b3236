//! Turn commands and the turn-start step that turns them into phases.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use tracing::debug;

use crate::core::{BattleState, BattlerIndex, BattlerSide, PhaseError};
use crate::phase::{
    MoveSlot, Phase, PhaseArgs, PhaseContext, PhaseHandler, PhaseKind, PhaseOutcome, SwitchType,
    TimingModifier,
};
use crate::queue::{sort_in_speed_order, OrderKey};

/// What a battler chose to do this turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnCommand {
    Fight {
        move_slot: MoveSlot,
        targets: SmallVec<[BattlerIndex; 4]>,
    },
    Switch {
        party_slot: u8,
        baton_pass: bool,
    },
    Ball {
        target: BattlerIndex,
    },
    Run,
}

impl TurnCommand {
    #[must_use]
    pub fn fight(move_slot: MoveSlot, targets: impl IntoIterator<Item = BattlerIndex>) -> Self {
        Self::Fight {
            move_slot,
            targets: targets.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_fight(&self) -> bool {
        matches!(self, Self::Fight { .. })
    }
}

/// Active battlers in the order their commands resolve.
///
/// Switching, items and running go before any attack. Attacks follow move
/// priority, then speed bypass, then speed.
#[must_use]
pub fn command_order(state: &BattleState) -> Vec<BattlerIndex> {
    let mut order: Vec<BattlerIndex> = state.active_battlers().map(|b| b.index).collect();
    sort_in_speed_order(&mut order, state, |index| command_key(state, *index));
    order
}

fn command_key(state: &BattleState, index: BattlerIndex) -> OrderKey {
    let base = OrderKey::for_battler(index, state);
    match state.command(index) {
        Some(TurnCommand::Fight { move_slot, .. }) => OrderKey {
            priority: move_slot.priority,
            ..base
        },
        Some(_) => OrderKey {
            timing: TimingModifier::First,
            ..base
        },
        None => base,
    }
}

/// The player battler that attempts to flee: the faster one in doubles.
fn runner(state: &BattleState, commander: BattlerIndex) -> BattlerIndex {
    if !state.double {
        return commander;
    }
    state
        .active_battlers()
        .filter(|b| b.index.side() == BattlerSide::Player)
        .fold(None::<(BattlerIndex, u32)>, |best, b| match best {
            Some((_, speed)) if speed >= b.effective_speed => best,
            _ => Some((b.index, b.effective_speed)),
        })
        .map_or(commander, |(index, _)| index)
}

/// Queues each battler's command, then the end-of-turn phases.
#[derive(Clone, Copy, Debug, Default)]
pub struct TurnStartHandler;

impl PhaseHandler for TurnStartHandler {
    fn start(
        &mut self,
        _phase: &Phase,
        ctx: &mut PhaseContext<'_>,
    ) -> Result<PhaseOutcome, PhaseError> {
        let order = command_order(ctx.state);
        debug!(?order, turn = ctx.state.turn, "command order");

        for index in &order {
            let Some(command) = ctx.state.command(*index).cloned() else {
                continue;
            };
            match command {
                TurnCommand::Fight { move_slot, targets } => {
                    ctx.queues
                        .push_phase(Phase::move_use(*index, move_slot, targets));
                }
                TurnCommand::Ball { target } => {
                    ctx.queues.unshift_phase(Phase::with_args(
                        PhaseKind::AttemptCapture,
                        PhaseArgs {
                            battler: Some(*index),
                            targets: smallvec![target],
                            ..PhaseArgs::default()
                        },
                    ));
                }
                TurnCommand::Switch {
                    party_slot,
                    baton_pass,
                } => {
                    let switch_type = if baton_pass {
                        SwitchType::BatonPass
                    } else {
                        SwitchType::Switch
                    };
                    ctx.queues.unshift_phase(
                        Phase::for_battler(PhaseKind::SwitchSummon, *index)
                            .with_switch(switch_type, Some(party_slot)),
                    );
                }
                TurnCommand::Run => {
                    let battler = runner(ctx.state, *index);
                    ctx.queues
                        .unshift_phase(Phase::for_battler(PhaseKind::AttemptRun, battler));
                }
            }
        }

        for index in &order {
            let statused = ctx
                .state
                .battler(*index)
                .is_some_and(|b| b.post_turn_status);
            if statused {
                ctx.queues
                    .push_phase(Phase::for_battler(PhaseKind::PostTurnStatusEffect, *index));
            }
        }

        ctx.queues.queue_turn_end_phases();
        Ok(PhaseOutcome::Ended)
    }
}
