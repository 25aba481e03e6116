// Per-tick simulation systems that run over the domain state.

pub mod projectiles;

pub use projectiles::{BlockedShot, Hit, TickOutcome, tick_projectiles};
