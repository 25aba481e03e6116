// Use cases layer: the single-owner world task and the channels around it.

pub mod arena;
pub mod game;
pub mod shield_timers;
pub mod types;

pub use arena::{ArenaError, ArenaHandle, ArenaSettings};
pub use game::WorldSettings;
pub use types::{GameEvent, JoinOutcome, Welcome, WorldUpdate};
