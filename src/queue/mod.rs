//! Phase queues.
//!
//! - [`PhaseTree`]: the main queue, FIFO with nested levels for follow-ups
//! - [`PriorityQueue`] and its implementations: speed-ordered queues that
//!   re-sort on every pop
//! - [`DynamicQueueManager`]: one priority queue per dynamic phase kind,
//!   activated by markers in the main queue
//! - [`sort_in_speed_order`]: the shared ordering routine

pub mod dynamic;
pub mod priority;
pub mod speed;
pub mod tree;

pub use dynamic::{DynamicQueue, DynamicQueueManager, Routed};
pub use priority::{
    MovePhasePriorityQueue, PokemonPhasePriorityQueue, PokemonPriorityQueue, PriorityQueue,
    SwitchSummonPriorityQueue,
};
pub use speed::{sort_in_speed_order, OrderKey};
pub use tree::PhaseTree;
