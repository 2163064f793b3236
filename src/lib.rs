//! # battle-scheduler
//!
//! Phase scheduling for turn-based monster battles.
//!
//! A battle resolves as a sequence of small steps ("phases"): take a
//! command, use a move, apply its effect, faint, switch in, run end-of-turn
//! effects. The scheduler decides which phase runs next.
//!
//! ## Design Principles
//!
//! 1. **Phases Are Data**: a phase is a kind tag plus arguments. Behaviour
//!    lives in a handler table, so games replace or add steps without
//!    touching the scheduler.
//!
//! 2. **Explicit State**: handlers receive the battle state and the queues
//!    through a context value. Two battles never share anything.
//!
//! 3. **Order Is Decided Late**: speed-ordered phases sit in priority queues
//!    that re-sort on every pop, so a speed change mid-turn is honoured.
//!
//! 4. **Reproducible**: speed ties break with an RNG derived from the wave
//!    seed and turn, so replays give the same order.
//!
//! ## Modules
//!
//! - `core`: battlers, battle state, RNG, configuration, errors
//! - `phase`: phase kinds, arguments, handlers
//! - `queue`: speed ordering, priority queues, the main phase tree
//! - `manager`: the run loop and the operations phases use to queue work
//! - `battle`: turn commands and the built-in turn flow

pub mod battle;
pub mod core;
pub mod manager;
pub mod phase;
pub mod queue;

// Re-export commonly used types
pub use crate::core::{
    BattleState, Battler, BattlerIndex, BattlerSide, CompletionToken, EmptyQueuePolicy,
    FieldView, GameRng, PhaseError, SchedulerConfig, SchedulerError,
};

pub use crate::phase::{
    MoveSlot, Phase, PhaseArgs, PhaseContext, PhaseHandler, PhaseHandlers, PhaseKind,
    PhaseOutcome, SwitchType, TimingModifier,
};

pub use crate::queue::{
    DynamicQueueManager, MovePhasePriorityQueue, PhaseTree, PokemonPhasePriorityQueue,
    PokemonPriorityQueue, PriorityQueue, SwitchSummonPriorityQueue,
};

pub use crate::manager::{
    EntranceParams, EntranceTiming, PhaseManager, PhaseQueues, RunStatus, SwitchOutParams,
    SwitchOutTiming,
};

pub use crate::battle::{command_order, standard_handlers, TurnCommand};
