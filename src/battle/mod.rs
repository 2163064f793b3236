//! Built-in battle flow: turn commands, command ordering, and the handlers
//! that keep a turn cycling.

mod handlers;
mod turn;

pub use handlers::standard_handlers;
pub use turn::{command_order, TurnCommand, TurnStartHandler};
