// Domain layer: core duel types and rules.

pub mod commands;
pub mod seats;
pub mod state;
pub mod tuning;

pub use commands::{CommandEffect, PlayerCommand, apply_command};
pub use seats::{AdmitError, Departure, MAX_PLAYERS, SeatRegistry};
pub use state::{GameState, Player, PlayerId, Projectile, ProjectileId};
pub use tuning::Rules;
