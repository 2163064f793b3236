//! Core types: battlers, battle state, RNG, configuration, errors.
//!
//! Everything the scheduler needs from the battle beyond the phases
//! themselves. Games extend behaviour through handlers, not by
//! modifying these types.

pub mod battler;
pub mod config;
pub mod error;
pub mod rng;
pub mod state;

pub use battler::{Battler, BattlerIndex, BattlerSide, FieldMap, FIELD_SLOTS};
pub use config::{EmptyQueuePolicy, SchedulerConfig};
pub use error::{CompletionToken, PhaseError, SchedulerError};
pub use rng::GameRng;
pub use state::{BattleState, FieldView, PhaseRecord};
