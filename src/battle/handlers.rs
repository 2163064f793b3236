//! Built-in handlers for the battle skeleton.
//!
//! They move battlers on and off the field and keep the turn cycling. None
//! of them does damage or animation; games register their own handler for
//! any kind they need to flesh out, replacing the built-in one.

use tracing::debug;

use crate::core::{BattleState, BattlerIndex, PhaseError};
use crate::phase::{Phase, PhaseArgs, PhaseContext, PhaseHandlers, PhaseKind, PhaseOutcome};

use super::turn::TurnStartHandler;

type HandlerResult = Result<PhaseOutcome, PhaseError>;

const ESCAPE_ROLL: u32 = 256;

/// Handler table with every built-in kind covered.
///
/// ```
/// use battle_scheduler::battle::standard_handlers;
/// use battle_scheduler::phase::PhaseKind;
///
/// let handlers = standard_handlers();
/// assert!(handlers.contains(PhaseKind::TurnStart));
/// assert!(!handlers.contains(PhaseKind::DynamicMarker));
/// ```
#[must_use]
pub fn standard_handlers() -> PhaseHandlers {
    let mut handlers = PhaseHandlers::new();
    for kind in PhaseKind::BUILT_IN {
        handlers.register_fn(*kind, end_phase);
    }
    handlers.register_fn(PhaseKind::TurnInit, turn_init);
    handlers.register_fn(PhaseKind::Command, command);
    handlers.register(PhaseKind::TurnStart, TurnStartHandler);
    handlers.register_fn(PhaseKind::Move, move_phase);
    handlers.register_fn(PhaseKind::Faint, faint);
    handlers.register_fn(PhaseKind::Recall, recall);
    handlers.register_fn(PhaseKind::Summon, summon);
    handlers.register_fn(PhaseKind::SwitchSummon, switch_summon);
    handlers.register_fn(PhaseKind::AttemptRun, attempt_run);
    handlers.register_fn(PhaseKind::Message, message);
    handlers.register_fn(PhaseKind::TurnEnd, turn_end);
    handlers
}

fn end_phase(_phase: &Phase, _ctx: &mut PhaseContext<'_>) -> HandlerResult {
    Ok(PhaseOutcome::Ended)
}

fn require_battler(phase: &Phase) -> Result<BattlerIndex, PhaseError> {
    phase
        .battler()
        .ok_or(PhaseError::MissingBattler(phase.kind()))
}

/// Advance the turn and ask every active battler for a command.
fn turn_init(_phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    ctx.state.turn += 1;
    ctx.state.clear_commands();

    let active: Vec<_> = ctx.state.active_battlers().map(|b| b.index).collect();
    for index in active {
        let kind = if index.is_enemy() {
            PhaseKind::EnemyCommand
        } else {
            PhaseKind::Command
        };
        ctx.queues.push_phase(Phase::for_battler(kind, index));
    }
    ctx.queues.push_phase(Phase::new(PhaseKind::TurnStart));
    Ok(PhaseOutcome::Ended)
}

/// Wait for the player unless a command is already set.
fn command(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let battler = require_battler(phase)?;
    if ctx.state.command(battler).is_some() {
        Ok(PhaseOutcome::Ended)
    } else {
        Ok(PhaseOutcome::Suspended)
    }
}

fn move_phase(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let battler = require_battler(phase)?;
    if !ctx.state.is_on_field(battler) {
        debug!(%battler, "user left the field; move skipped");
        return Ok(PhaseOutcome::Ended);
    }

    ctx.queues.unshift_phase(Phase::with_args(
        PhaseKind::MoveEffect,
        PhaseArgs {
            battler: Some(battler),
            targets: phase.args.targets.clone(),
            move_slot: phase.args.move_slot,
            ..PhaseArgs::default()
        },
    ));
    ctx.queues
        .unshift_phase(Phase::for_battler(PhaseKind::MoveEnd, battler));
    Ok(PhaseOutcome::Ended)
}

/// Take the battler off the field and point pending attacks at its ally.
fn faint(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let battler = require_battler(phase)?;
    let fainted = ctx
        .state
        .battler_mut(battler)
        .ok_or(PhaseError::BattlerNotFound(battler))?;
    fainted.active = false;

    ctx.queues.cancel_move(|p| p.battler() == Some(battler));
    let ally = battler.ally();
    if ctx.state.double && ctx.state.is_on_field(ally) {
        ctx.queues.redirect_moves(battler, ally);
    }
    Ok(PhaseOutcome::Ended)
}

fn recall(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let battler = require_battler(phase)?;
    if let Some(recalled) = ctx.state.battler_mut(battler) {
        recalled.active = false;
    }
    Ok(PhaseOutcome::Ended)
}

fn summon(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let battler = require_battler(phase)?;
    let summoned = ctx
        .state
        .battler_mut(battler)
        .ok_or(PhaseError::BattlerNotFound(battler))?;
    if let Some(slot) = phase.args.switch_in {
        summoned.party_slot = slot;
    }
    summoned.active = true;
    Ok(PhaseOutcome::Ended)
}

/// A switch chosen as the turn's command.
fn switch_summon(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let battler = require_battler(phase)?;
    let party_slot = phase.args.switch_in.ok_or_else(|| PhaseError::InvalidArgs {
        kind: phase.kind(),
        reason: "no party member to switch in".into(),
    })?;
    let switched = ctx
        .state
        .battler_mut(battler)
        .ok_or(PhaseError::BattlerNotFound(battler))?;
    switched.party_slot = party_slot;
    switched.active = true;

    ctx.queues
        .unshift_phase(Phase::for_battler(PhaseKind::PostSummon, battler));
    Ok(PhaseOutcome::Ended)
}

/// Escape chance out of 256 for `runner`.
///
/// Compares the runner's speed with the enemy side's average; every earlier
/// failed attempt adds 30. Nothing to escape from means a sure escape.
fn escape_chance(state: &BattleState, runner: BattlerIndex) -> u32 {
    let enemies: Vec<u32> = state
        .active_battlers()
        .filter(|b| b.index.is_enemy())
        .map(|b| b.effective_speed)
        .collect();
    let enemy_total: u32 = enemies.iter().sum();
    if enemy_total == 0 {
        return ESCAPE_ROLL;
    }
    let enemy_speed = enemy_total / enemies.len() as u32;
    let speed = state.battler(runner).map_or(0, |b| b.effective_speed);
    let chance = (speed.saturating_mul(128) / enemy_speed)
        .saturating_add(state.escape_attempts.saturating_mul(30));
    chance.min(ESCAPE_ROLL)
}

/// Roll the escape. Success drops everything queued and ends the battle.
fn attempt_run(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    let runner = require_battler(phase)?;
    let chance = escape_chance(ctx.state, runner);
    let roll = ctx.state.rng.gen_range(0..ESCAPE_ROLL as i32);

    if (roll as u32) < chance {
        debug!(%runner, chance, "escaped");
        ctx.queues.clear_all();
        ctx.queues.push_phase(Phase::new(PhaseKind::BattleEnd));
    } else {
        debug!(%runner, chance, "escape failed");
        ctx.state.escape_attempts += 1;
    }
    Ok(PhaseOutcome::Ended)
}

/// Messages wait for the player to acknowledge them.
fn message(_phase: &Phase, _ctx: &mut PhaseContext<'_>) -> HandlerResult {
    Ok(PhaseOutcome::Suspended)
}

fn turn_end(phase: &Phase, ctx: &mut PhaseContext<'_>) -> HandlerResult {
    if phase.args.upcoming_interlude {
        debug!(turn = ctx.state.turn, "turn ends before an interlude");
    }
    Ok(PhaseOutcome::Ended)
}
