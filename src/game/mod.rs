//! Game flow around a drop
//!
//! Prize selection checks and the phase state machine that gates trajectory
//! playback. Nothing here runs physics; outcomes come from `sim`.

pub mod machine;
pub mod prize;

pub use machine::{GameContext, GameEvent, GameMachine, GameState, TransitionError};
pub use prize::{Prize, PrizeError, PrizeSelection, swap_to_slot};
