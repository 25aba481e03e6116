/// Gameplay tuning for word projectiles.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Distance travelled per tick in pixels (sign is chosen by the shooter's side).
    pub speed: f32,

    /// Vertical offset from the shooter's top edge.
    pub spawn_y_offset: f32,

    /// Gap left in front of a right-side shooter's left edge.
    pub right_spawn_gap: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 8.0,
            spawn_y_offset: 15.0,
            right_spawn_gap: 10.0,
        }
    }
}
