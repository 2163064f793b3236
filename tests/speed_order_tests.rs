//! Speed ordering integration tests.
//!
//! These tests check the ordering rules end to end through the priority
//! queues: brackets over priority, priority over speed, seeded tie-breaks,
//! and re-sorting on every pop.

use battle_scheduler::core::{BattleState, Battler, BattlerIndex};
use battle_scheduler::phase::{MoveSlot, Phase, PhaseKind, TimingModifier};
use battle_scheduler::queue::{
    MovePhasePriorityQueue, PokemonPhasePriorityQueue, PokemonPriorityQueue, PriorityQueue,
};
use proptest::prelude::*;

fn doubles(seed: u64, speeds: [u32; 4]) -> BattleState {
    let mut state = BattleState::new_double(seed);
    for (slot, speed) in speeds.into_iter().enumerate() {
        state.set_battler(Battler::new(BattlerIndex::new(slot as u8), speed));
    }
    state
}

fn attack(user: BattlerIndex, priority: i8) -> Phase {
    Phase::move_use(user, MoveSlot::new(1, priority), [])
}

fn pop_all(queue: &mut MovePhasePriorityQueue, state: &BattleState) -> Vec<BattlerIndex> {
    std::iter::from_fn(|| queue.pop(state))
        .filter_map(|p| p.battler())
        .collect()
}

// =============================================================================
// Determinism
// =============================================================================

/// Test that the same seed and speeds always give the same sequence.
#[test]
fn test_order_is_deterministic() {
    let run = || {
        let state = doubles(1234, [60, 60, 60, 60]);
        let mut queue = MovePhasePriorityQueue::new();
        for index in BattlerIndex::all(true) {
            queue.push(attack(index, 0));
        }
        pop_all(&mut queue, &state)
    };

    let first = run();
    for _ in 0..10 {
        assert_eq!(run(), first);
    }
}

/// Test that a cloned state orders identically to its source.
#[test]
fn test_clone_orders_identically() {
    let state = doubles(77, [80, 80, 40, 40]);
    let copy = state.clone();

    let mut a = PokemonPriorityQueue::new();
    let mut b = PokemonPriorityQueue::new();
    for index in BattlerIndex::all(true) {
        a.push(index);
        b.push(index);
    }

    let from_state: Vec<_> = std::iter::from_fn(|| a.pop(&state)).collect();
    let from_copy: Vec<_> = std::iter::from_fn(|| b.pop(&copy)).collect();
    assert_eq!(from_state, from_copy);
}

// =============================================================================
// Precedence
// =============================================================================

/// Test that a First-bracket phase at speed 1 beats a Normal one at speed 999.
#[test]
fn test_bracket_dominates_speed() {
    let state = doubles(5, [1, 500, 999, 700]);
    let mut queue = MovePhasePriorityQueue::new();
    queue.push(attack(BattlerIndex::ENEMY, 0));
    queue.push(attack(BattlerIndex::PLAYER, 0).with_timing(TimingModifier::First));

    assert_eq!(
        queue.pop(&state).and_then(|p| p.battler()),
        Some(BattlerIndex::PLAYER)
    );
}

/// Test the full ordering across brackets, priority and speed.
#[test]
fn test_full_precedence() {
    let state = doubles(5, [10, 20, 30, 40]);
    let mut queue = MovePhasePriorityQueue::new();
    queue.push(attack(BattlerIndex::ENEMY_2, 0).with_timing(TimingModifier::Last));
    queue.push(attack(BattlerIndex::ENEMY, 0));
    queue.push(attack(BattlerIndex::PLAYER_2, 0));
    queue.push(attack(BattlerIndex::PLAYER, 2));

    assert_eq!(
        pop_all(&mut queue, &state),
        vec![
            BattlerIndex::PLAYER,
            BattlerIndex::ENEMY,
            BattlerIndex::PLAYER_2,
            BattlerIndex::ENEMY_2
        ]
    );
}

/// Test that reversed speed flips only the speed step.
#[test]
fn test_trick_room_keeps_priority() {
    let mut state = doubles(5, [10, 20, 30, 40]);
    state.trick_room = true;
    let mut queue = MovePhasePriorityQueue::new();
    queue.push(attack(BattlerIndex::ENEMY_2, 1));
    queue.push(attack(BattlerIndex::ENEMY, 0));
    queue.push(attack(BattlerIndex::PLAYER, 0));

    assert_eq!(
        pop_all(&mut queue, &state),
        vec![BattlerIndex::ENEMY_2, BattlerIndex::PLAYER, BattlerIndex::ENEMY]
    );
}

/// Test that speed-only queues ignore move priority.
#[test]
fn test_pokemon_phase_queue_ignores_priority() {
    let state = doubles(5, [10, 20, 30, 40]);
    let mut queue = PokemonPhasePriorityQueue::new();
    let mut quick = Phase::for_battler(PhaseKind::PostSummon, BattlerIndex::PLAYER);
    quick.args.move_slot = Some(MoveSlot::new(1, 5));
    queue.push(quick);
    queue.push(Phase::for_battler(PhaseKind::PostSummon, BattlerIndex::ENEMY));

    assert_eq!(
        queue.pop(&state).and_then(|p| p.battler()),
        Some(BattlerIndex::ENEMY)
    );
}

// =============================================================================
// Tie-breaks
// =============================================================================

/// Test that equal speeds split roughly evenly across seeds.
#[test]
fn test_tie_break_is_fair() {
    let trials = 400u64;
    let mut player_wins = 0;
    for seed in 0..trials {
        let state = BattleState::new(seed)
            .with_battler(Battler::new(BattlerIndex::PLAYER, 100))
            .with_battler(Battler::new(BattlerIndex::ENEMY, 100));
        let mut queue = PokemonPriorityQueue::new();
        queue.push(BattlerIndex::PLAYER);
        queue.push(BattlerIndex::ENEMY);
        if queue.pop(&state) == Some(BattlerIndex::PLAYER) {
            player_wins += 1;
        }
    }
    assert!(
        (140..=260).contains(&player_wins),
        "player won {player_wins} of {trials} ties"
    );
}

/// Test that a single seed always produces the same tie winner.
#[test]
fn test_tie_break_reproducible_per_seed() {
    for seed in [1, 2, 3, 99, 1000] {
        let winner = || {
            let state = BattleState::new(seed)
                .with_battler(Battler::new(BattlerIndex::PLAYER, 100))
                .with_battler(Battler::new(BattlerIndex::ENEMY, 100));
            let mut queue = PokemonPriorityQueue::new();
            queue.push(BattlerIndex::ENEMY);
            queue.push(BattlerIndex::PLAYER);
            queue.pop(&state)
        };
        assert_eq!(winner(), winner());
    }
}

// =============================================================================
// Re-sorting
// =============================================================================

/// Test that a later, higher-priority push pops first.
#[test]
fn test_resort_after_push() {
    let state = doubles(8, [50, 50, 50, 50]);
    let mut queue = MovePhasePriorityQueue::new();
    queue.push(attack(BattlerIndex::PLAYER, 0));
    queue.push(attack(BattlerIndex::PLAYER_2, 0));
    assert!(queue.pop(&state).is_some());

    queue.push(attack(BattlerIndex::ENEMY, 3));
    assert_eq!(
        queue.pop(&state).and_then(|p| p.battler()),
        Some(BattlerIndex::ENEMY)
    );
}

/// Test that a speed change between pops is honoured.
#[test]
fn test_resort_after_speed_change() {
    let mut state = doubles(8, [10, 20, 30, 40]);
    let mut queue = MovePhasePriorityQueue::new();
    for index in BattlerIndex::all(true) {
        queue.push(attack(index, 0));
    }
    assert_eq!(
        queue.pop(&state).and_then(|p| p.battler()),
        Some(BattlerIndex::ENEMY_2)
    );

    state.battler_mut(BattlerIndex::PLAYER).unwrap().effective_speed = 500;
    assert_eq!(
        queue.pop(&state).and_then(|p| p.battler()),
        Some(BattlerIndex::PLAYER)
    );
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Higher move priority always goes first, whatever the speeds.
    #[test]
    fn prop_priority_dominates_speed(
        slow in 1u32..1000,
        fast in 1u32..1000,
        low in -7i8..5,
        bump in 1i8..3,
        seed in any::<u64>(),
    ) {
        let state = BattleState::new(seed)
            .with_battler(Battler::new(BattlerIndex::PLAYER, slow))
            .with_battler(Battler::new(BattlerIndex::ENEMY, fast));
        let mut queue = MovePhasePriorityQueue::new();
        queue.push(attack(BattlerIndex::ENEMY, low));
        queue.push(attack(BattlerIndex::PLAYER, low + bump));

        prop_assert_eq!(
            queue.pop(&state).and_then(|p| p.battler()),
            Some(BattlerIndex::PLAYER)
        );
    }

    /// The pop sequence is a function of seed and speeds alone.
    #[test]
    fn prop_order_deterministic(seed in any::<u64>(), speeds in prop::array::uniform4(1u32..50)) {
        let run = || {
            let state = doubles(seed, speeds);
            let mut queue = MovePhasePriorityQueue::new();
            for index in BattlerIndex::all(true) {
                queue.push(attack(index, 0));
            }
            pop_all(&mut queue, &state)
        };
        prop_assert_eq!(run(), run());
    }

    /// Pops come out in non-increasing speed order.
    #[test]
    fn prop_sorted_by_speed(seed in any::<u64>(), speeds in prop::array::uniform4(1u32..500)) {
        let state = doubles(seed, speeds);
        let mut queue = MovePhasePriorityQueue::new();
        for index in BattlerIndex::all(true) {
            queue.push(attack(index, 0));
        }
        let popped: Vec<u32> = pop_all(&mut queue, &state)
            .into_iter()
            .map(|index| speeds[index.index()])
            .collect();
        prop_assert!(popped.windows(2).all(|w| w[0] >= w[1]));
    }
}
