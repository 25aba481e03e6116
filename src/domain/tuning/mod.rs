// Gameplay tuning, kept apart from runtime/server configuration.

pub mod player;
pub mod projectile;

use player::PlayerTuning;
use projectile::ProjectileTuning;

/// Everything the simulation needs to know about the arena.
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    /// Projectiles are live only strictly inside `(0, canvas_width)`.
    pub canvas_width: f32,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            player: PlayerTuning::default(),
            projectile: ProjectileTuning::default(),
        }
    }
}
