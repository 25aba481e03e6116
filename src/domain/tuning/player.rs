/// Gameplay tuning for the two duelists.
///
/// Players never move server-side, so this only describes where they stand and how big
/// their hitbox is.

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Hitbox width in pixels.
    pub width: f32,

    /// Hitbox height in pixels.
    pub height: f32,

    /// Top-left corner for odd ids (left edge of the arena).
    pub left_spawn: (f32, f32),

    /// Top-left corner for even ids (right edge of the arena).
    pub right_spawn: (f32, f32),

    /// Score clients treat as "match won". The server only reports it.
    pub winning_score: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            left_spawn: (50.0, 280.0),
            right_spawn: (1130.0, 280.0),
            winning_score: 3,
        }
    }
}
