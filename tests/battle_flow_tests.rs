//! Full-turn tests using the built-in handlers.
//!
//! Each test sets up a field, picks commands and runs turns through the
//! manager, then checks the sequence of phases that started.

use std::cell::RefCell;
use std::rc::Rc;

use battle_scheduler::battle::{standard_handlers, TurnCommand};
use battle_scheduler::core::{
    BattleState, Battler, BattlerIndex, EmptyQueuePolicy, SchedulerConfig,
};
use battle_scheduler::manager::{PhaseManager, RunStatus, SwitchOutParams};
use battle_scheduler::phase::{MoveSlot, Phase, PhaseHandlers, PhaseKind, PhaseOutcome};

const TACKLE: MoveSlot = MoveSlot::new(33, 0);
const KNOCK_OUT: MoveSlot = MoveSlot::new(12, 0);

fn singles(player_speed: u32, enemy_speed: u32) -> BattleState {
    BattleState::new(2024)
        .with_battler(Battler::new(BattlerIndex::PLAYER, player_speed))
        .with_battler(Battler::new(BattlerIndex::ENEMY, enemy_speed))
}

fn doubles() -> BattleState {
    BattleState::new_double(2024)
        .with_battler(Battler::new(BattlerIndex::PLAYER, 10))
        .with_battler(Battler::new(BattlerIndex::PLAYER_2, 20))
        .with_battler(Battler::new(BattlerIndex::ENEMY, 30))
        .with_battler(Battler::new(BattlerIndex::ENEMY_2, 40))
}

fn manager() -> PhaseManager {
    PhaseManager::new(SchedulerConfig::default()).unwrap()
}

fn trace(state: &BattleState) -> Vec<String> {
    state
        .history()
        .iter()
        .map(|record| match record.battler {
            Some(battler) => format!("{}@{}", record.kind, battler.0),
            None => record.kind.to_string(),
        })
        .collect()
}

fn moves_used(state: &BattleState) -> Vec<BattlerIndex> {
    state
        .history()
        .iter()
        .filter(|r| r.kind == PhaseKind::Move)
        .filter_map(|r| r.battler)
        .collect()
}

/// Handlers whose move effect faints every target of `KNOCK_OUT`.
fn handlers_with_knock_out() -> PhaseHandlers {
    let mut handlers = standard_handlers();
    handlers.register_fn(PhaseKind::MoveEffect, |phase, ctx| {
        if phase.args.move_slot != Some(KNOCK_OUT) {
            return Ok(PhaseOutcome::Ended);
        }
        for target in phase.args.targets.clone() {
            if let Some(battler) = ctx.state.battler_mut(target) {
                battler.hp = 0;
                ctx.queues.queue_faint_phase(target);
            }
        }
        Ok(PhaseOutcome::Ended)
    });
    handlers
}

/// Start a turn and answer the player's command prompt.
fn play_turn(
    manager: &mut PhaseManager,
    state: &mut BattleState,
    handlers: &mut PhaseHandlers,
    commands: &[(BattlerIndex, TurnCommand)],
) -> RunStatus {
    manager.push_phase(Phase::new(PhaseKind::TurnInit));
    let mut status = manager.run(state, handlers).unwrap();
    // Every player battler prompts once
    while let RunStatus::Suspended(token) = status {
        if !manager.current_phase().is_some_and(|p| p.is(PhaseKind::Command)) {
            break;
        }
        for (index, command) in commands {
            state.set_command(*index, command.clone());
        }
        status = manager.resume(token, state, handlers).unwrap();
    }
    status
}

// =============================================================================
// Turn Skeleton
// =============================================================================

/// Test a singles turn from init to turn end.
#[test]
fn test_singles_turn() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let mut state = singles(50, 80);

    manager.push_phase(Phase::new(PhaseKind::TurnInit));
    let RunStatus::Suspended(token) = manager.run(&mut state, &mut handlers).unwrap() else {
        panic!("command phase should wait for input");
    };
    assert_eq!(state.turn, 1);
    assert_eq!(trace(&state), vec!["TurnInitPhase", "CommandPhase@0"]);

    state.set_command(BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY]));
    state.set_command(BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER]));
    assert_eq!(
        manager.resume(token, &mut state, &mut handlers),
        Ok(RunStatus::Drained)
    );

    assert_eq!(
        trace(&state),
        vec![
            "TurnInitPhase",
            "CommandPhase@0",
            "EnemyCommandPhase@2",
            "TurnStartPhase",
            "MovePhase@2",
            "MoveEffectPhase@2",
            "MoveEndPhase@2",
            "MovePhase@0",
            "MoveEffectPhase@0",
            "MoveEndPhase@0",
            "WeatherEffectPhase",
            "PositionalTagPhase",
            "BerryPhase",
            "CheckStatusEffectPhase",
            "TurnEndPhase",
        ]
    );
}

/// Test that the StartTurn policy cycles straight into the next turn.
#[test]
fn test_turns_cycle() {
    let config = SchedulerConfig::default().with_empty_queue(EmptyQueuePolicy::StartTurn);
    let mut manager = PhaseManager::new(config).unwrap();
    let mut handlers = standard_handlers();
    let mut state = singles(50, 80);

    let RunStatus::Suspended(token) = manager.run(&mut state, &mut handlers).unwrap() else {
        panic!("expected the first command prompt");
    };
    state.set_command(BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY]));
    state.set_command(BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER]));

    let status = manager.resume(token, &mut state, &mut handlers).unwrap();
    assert!(matches!(status, RunStatus::Suspended(_)));
    assert_eq!(state.turn, 2);
    assert!(manager
        .current_phase()
        .is_some_and(|p| p.is(PhaseKind::Command)));
    assert_eq!(moves_used(&state).len(), 2);
}

/// Test that statused battlers get an end-of-turn step in speed order.
#[test]
fn test_post_turn_status() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let mut state = BattleState::new(7)
        .with_battler(Battler::new(BattlerIndex::PLAYER, 90).with_post_turn_status())
        .with_battler(Battler::new(BattlerIndex::ENEMY, 60).with_post_turn_status());

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY])),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );

    let tail: Vec<String> = trace(&state).into_iter().skip(10).collect();
    assert_eq!(
        tail,
        vec![
            "PostTurnStatusEffectPhase@0",
            "PostTurnStatusEffectPhase@2",
            "WeatherEffectPhase",
            "PositionalTagPhase",
            "BerryPhase",
            "CheckStatusEffectPhase",
            "TurnEndPhase",
        ]
    );
}

// =============================================================================
// Commands
// =============================================================================

/// Test that a switch resolves, with its post-summon step, before any move.
#[test]
fn test_switch_before_moves() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let mut state = singles(10, 200);

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (
                BattlerIndex::PLAYER,
                TurnCommand::Switch {
                    party_slot: 3,
                    baton_pass: false,
                },
            ),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );

    let after_turn_start: Vec<String> = trace(&state).into_iter().skip(4).take(5).collect();
    assert_eq!(
        after_turn_start,
        vec![
            "SwitchSummonPhase@0",
            "PostSummonPhase@0",
            "MovePhase@2",
            "MoveEffectPhase@2",
            "MoveEndPhase@2",
        ]
    );
    assert_eq!(
        state.battler(BattlerIndex::PLAYER).map(|b| b.party_slot),
        Some(3)
    );
}

/// Test that a successful escape discards the rest of the turn.
#[test]
fn test_run_ends_battle() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    handlers.register_fn(PhaseKind::AttemptRun, |_, ctx| {
        ctx.queues.clear_all();
        ctx.queues.push_phase(Phase::new(PhaseKind::BattleEnd));
        Ok(PhaseOutcome::Ended)
    });
    let mut state = singles(10, 200);

    let status = play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::Run),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );

    assert_eq!(status, RunStatus::Drained);
    let tail: Vec<String> = trace(&state).into_iter().skip(4).collect();
    assert_eq!(tail, vec!["AttemptRunPhase@0", "BattleEndPhase"]);
    assert!(moves_used(&state).is_empty());
}

/// Test that the faster player battler attempts the escape in doubles.
#[test]
fn test_run_uses_faster_partner() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let mut state = doubles();

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::Run),
            (BattlerIndex::PLAYER_2, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY])),
        ],
    );

    let runner = state
        .history()
        .iter()
        .find(|r| r.kind == PhaseKind::AttemptRun)
        .and_then(|r| r.battler);
    assert_eq!(runner, Some(BattlerIndex::PLAYER_2));
}

// =============================================================================
// Speed Order
// =============================================================================

/// Test that Trick Room lets the slower battler move first.
#[test]
fn test_trick_room_turn() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let mut state = singles(50, 80);
    state.trick_room = true;

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY])),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );
    assert_eq!(
        moves_used(&state),
        vec![BattlerIndex::PLAYER, BattlerIndex::ENEMY]
    );
}

/// Test that a priority move beats a faster battler's normal move.
#[test]
fn test_priority_move_first() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let mut state = singles(20, 300);

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (
                BattlerIndex::PLAYER,
                TurnCommand::fight(MoveSlot::new(98, 1), [BattlerIndex::ENEMY]),
            ),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );
    assert_eq!(
        moves_used(&state),
        vec![BattlerIndex::PLAYER, BattlerIndex::ENEMY]
    );
}

/// Test that a speed change mid-turn re-orders the moves still queued.
#[test]
fn test_speed_change_mid_turn() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    handlers.register_fn(PhaseKind::MoveEffect, |phase, ctx| {
        if phase.battler() == Some(BattlerIndex::ENEMY_2) {
            if let Some(player) = ctx.state.battler_mut(BattlerIndex::PLAYER) {
                player.effective_speed = 100;
            }
        }
        Ok(PhaseOutcome::Ended)
    });
    let mut state = doubles();

    let commands: Vec<_> = BattlerIndex::all(true)
        .map(|index| (index, TurnCommand::fight(TACKLE, [index.ally()])))
        .collect();
    play_turn(&mut manager, &mut state, &mut handlers, &commands);

    assert_eq!(
        moves_used(&state),
        vec![
            BattlerIndex::ENEMY_2,
            BattlerIndex::PLAYER,
            BattlerIndex::ENEMY,
            BattlerIndex::PLAYER_2
        ]
    );
}

// =============================================================================
// Fainting
// =============================================================================

/// Test that a knocked-out battler faints right after the hit and loses its
/// own move.
#[test]
fn test_knock_out_cancels_move() {
    let mut manager = manager();
    let mut handlers = handlers_with_knock_out();
    let mut state = singles(50, 80);

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY])),
            (BattlerIndex::ENEMY, TurnCommand::fight(KNOCK_OUT, [BattlerIndex::PLAYER])),
        ],
    );

    let after_turn_start: Vec<String> = trace(&state).into_iter().skip(4).take(5).collect();
    assert_eq!(
        after_turn_start,
        vec![
            "MovePhase@2",
            "MoveEffectPhase@2",
            "FaintPhase@0",
            "MoveEndPhase@2",
            "WeatherEffectPhase",
        ]
    );
    assert!(!state.is_on_field(BattlerIndex::PLAYER));
    assert_eq!(moves_used(&state), vec![BattlerIndex::ENEMY]);
}

/// Test that attacks aimed at a fainted battler move to its partner.
#[test]
fn test_knock_out_redirects_to_partner() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    let player_targets = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&player_targets);
    handlers.register_fn(PhaseKind::MoveEffect, move |phase, ctx| {
        if phase.battler() == Some(BattlerIndex::PLAYER) {
            seen.borrow_mut().extend(phase.args.targets.iter().copied());
        }
        if phase.args.move_slot == Some(KNOCK_OUT) {
            for target in phase.args.targets.clone() {
                if let Some(battler) = ctx.state.battler_mut(target) {
                    battler.hp = 0;
                    ctx.queues.queue_faint_phase(target);
                }
            }
        }
        Ok(PhaseOutcome::Ended)
    });
    let mut state = doubles();

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY])),
            (BattlerIndex::PLAYER_2, TurnCommand::fight(KNOCK_OUT, [BattlerIndex::ENEMY])),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
            (BattlerIndex::ENEMY_2, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );

    assert!(!state.is_on_field(BattlerIndex::ENEMY));
    assert_eq!(*player_targets.borrow(), vec![BattlerIndex::ENEMY_2]);
    assert_eq!(
        moves_used(&state),
        vec![
            BattlerIndex::ENEMY_2,
            BattlerIndex::ENEMY,
            BattlerIndex::PLAYER_2,
            BattlerIndex::PLAYER
        ]
    );
}

/// Test that a faint caused by end-of-turn weather settles before the next
/// end-of-turn effect.
#[test]
fn test_weather_faint_before_turn_end() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    handlers.register_fn(PhaseKind::WeatherEffect, |_, ctx| {
        if let Some(enemy) = ctx.state.battler_mut(BattlerIndex::ENEMY) {
            enemy.hp = 0;
        }
        ctx.queues.queue_faint_phase(BattlerIndex::ENEMY);
        Ok(PhaseOutcome::Ended)
    });
    let mut state = singles(50, 80);

    play_turn(
        &mut manager,
        &mut state,
        &mut handlers,
        &[
            (BattlerIndex::PLAYER, TurnCommand::fight(TACKLE, [BattlerIndex::ENEMY])),
            (BattlerIndex::ENEMY, TurnCommand::fight(TACKLE, [BattlerIndex::PLAYER])),
        ],
    );

    let tail: Vec<String> = trace(&state).into_iter().skip(10).collect();
    assert_eq!(
        tail,
        vec![
            "WeatherEffectPhase",
            "FaintPhase@2",
            "PositionalTagPhase",
            "BerryPhase",
            "CheckStatusEffectPhase",
            "TurnEndPhase",
        ]
    );
    assert!(!state.is_on_field(BattlerIndex::ENEMY));
}

// =============================================================================
// Switching
// =============================================================================

/// Test that two switch-outs queued together each finish before the next
/// starts, and both battlers end up back on the field.
#[test]
fn test_two_switch_outs_in_one_phase() {
    let mut manager = manager();
    let mut handlers = standard_handlers();
    handlers.register_fn(PhaseKind::Custom(1), |_, ctx| {
        for battler in [BattlerIndex::PLAYER, BattlerIndex::PLAYER_2] {
            let params = SwitchOutParams {
                switch_in: Some(battler.0 + 4),
                ..SwitchOutParams::default()
            };
            ctx.queues.queue_battler_switch_out(battler, params);
        }
        Ok(PhaseOutcome::Ended)
    });
    let mut state = doubles();

    manager.push_phase(Phase::new(PhaseKind::Custom(1)));
    manager.push_phase(Phase::new(PhaseKind::TurnEnd));
    assert_eq!(manager.run(&mut state, &mut handlers), Ok(RunStatus::Drained));

    assert_eq!(
        trace(&state),
        vec![
            "CustomPhase(1)",
            "RecallPhase@0",
            "SwitchPhase@0",
            "SummonPhase@0",
            "PostSummonPhase@0",
            "RecallPhase@1",
            "SwitchPhase@1",
            "SummonPhase@1",
            "PostSummonPhase@1",
            "TurnEndPhase",
        ]
    );
    for (battler, party_slot) in [(BattlerIndex::PLAYER, 4), (BattlerIndex::PLAYER_2, 5)] {
        assert!(state.is_on_field(battler));
        assert_eq!(state.battler(battler).map(|b| b.party_slot), Some(party_slot));
    }
}
