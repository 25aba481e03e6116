// Domain-level duel entities and the single authoritative aggregate.

use super::tuning::Rules;
use super::tuning::player::PlayerTuning;
use std::collections::BTreeMap;

pub type PlayerId = u8;
pub type ProjectileId = u64;

/// Which edge of the arena a player defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Odd ids stand on the left, even ids on the right.
    pub fn of(player_id: PlayerId) -> Self {
        if player_id % 2 == 1 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Sign of the x velocity for shots fired from this side.
    pub fn direction(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: u32,
    pub shield: bool,
}

impl Player {
    pub fn spawn(id: PlayerId, tuning: &PlayerTuning) -> Self {
        let (x, y) = match Side::of(id) {
            Side::Left => tuning.left_spawn,
            Side::Right => tuning.right_spawn,
        };
        Self {
            id,
            x,
            y,
            width: tuning.width,
            height: tuning.height,
            score: 0,
            shield: false,
        }
    }

    /// Inclusive axis-aligned containment test against the hitbox.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub word: String,
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    // Signed distance per tick; the sign is the travel direction.
    pub speed: f32,
}

/// Players, projectiles and nothing else. Shield timers live with the world task.
#[derive(Debug)]
pub struct GameState {
    pub players: BTreeMap<PlayerId, Player>,
    pub projectiles: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            projectiles: Vec::new(),
            next_projectile_id: 1,
        }
    }

    /// Spawns a projectile in front of `shooter`, heading towards the opposite edge.
    pub fn spawn_projectile(
        &mut self,
        shooter: PlayerId,
        word: String,
        rules: &Rules,
    ) -> Option<ProjectileId> {
        let player = self.players.get(&shooter)?;
        let side = Side::of(shooter);
        let x = match side {
            Side::Left => player.x + player.width,
            Side::Right => player.x - rules.projectile.right_spawn_gap,
        };
        let y = player.y + rules.projectile.spawn_y_offset;

        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        self.projectiles.push(Projectile {
            id,
            word,
            owner: shooter,
            x,
            y,
            speed: side.direction() * rules.projectile.speed,
        });
        Some(id)
    }

    /// Clears the shield after its window elapsed. Returns false when there was nothing to clear.
    pub fn expire_shield(&mut self, player_id: PlayerId) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) if player.shield => {
                player.shield = false;
                true
            }
            _ => false,
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(ids: &[PlayerId], rules: &Rules) -> GameState {
        let mut state = GameState::new();
        for &id in ids {
            state.players.insert(id, Player::spawn(id, &rules.player));
        }
        state
    }

    #[test]
    fn players_spawn_on_opposite_edges_by_parity() {
        let rules = Rules::default();
        let left = Player::spawn(1, &rules.player);
        let right = Player::spawn(2, &rules.player);

        assert_eq!((left.x, left.y), (50.0, 280.0));
        assert_eq!((right.x, right.y), (1130.0, 280.0));
        assert_eq!((left.width, left.height), (20.0, 20.0));
        assert_eq!(left.score, 0);
        assert!(!right.shield);
    }

    #[test]
    fn hitbox_is_inclusive_on_every_edge() {
        let player = Player::spawn(2, &Rules::default().player);

        assert!(player.contains(1130.0, 280.0));
        assert!(player.contains(1150.0, 300.0));
        assert!(!player.contains(1129.9, 290.0));
        assert!(!player.contains(1140.0, 300.1));
    }

    #[test]
    fn left_shot_spawns_at_right_edge_moving_right() {
        let rules = Rules::default();
        let mut state = state_with(&[1, 2], &rules);

        let id = state.spawn_projectile(1, "KAIZEN".into(), &rules);

        assert!(id.is_some());
        let shot = &state.projectiles[0];
        assert_eq!(shot.owner, 1);
        assert_eq!(shot.word, "KAIZEN");
        assert_eq!((shot.x, shot.y), (70.0, 295.0));
        assert_eq!(shot.speed, 8.0);
    }

    #[test]
    fn right_shot_spawns_before_left_edge_moving_left() {
        let rules = Rules::default();
        let mut state = state_with(&[1, 2], &rules);

        state.spawn_projectile(2, "MUDA".into(), &rules);

        let shot = &state.projectiles[0];
        assert_eq!((shot.x, shot.y), (1120.0, 295.0));
        assert_eq!(shot.speed, -8.0);
    }

    #[test]
    fn projectile_ids_are_unique() {
        let rules = Rules::default();
        let mut state = state_with(&[1], &rules);

        let a = state.spawn_projectile(1, "A".into(), &rules);
        let b = state.spawn_projectile(1, "B".into(), &rules);

        assert_ne!(a, b);
    }

    #[test]
    fn absent_shooter_spawns_nothing() {
        let rules = Rules::default();
        let mut state = state_with(&[1], &rules);

        assert_eq!(state.spawn_projectile(2, "LEAN".into(), &rules), None);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn expiring_a_missing_or_lowered_shield_is_a_no_op() {
        let rules = Rules::default();
        let mut state = state_with(&[1], &rules);

        assert!(!state.expire_shield(1));
        assert!(!state.expire_shield(2));

        if let Some(player) = state.players.get_mut(&1) {
            player.shield = true;
        }
        assert!(state.expire_shield(1));
        assert!(!state.player(1).is_some_and(|p| p.shield));
    }
}
