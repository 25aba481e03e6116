use crate::domain::state::{Player, PlayerId, Projectile, ProjectileId};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// A projectile that reached an unshielded opponent.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub projectile_id: ProjectileId,
    pub shooter_id: PlayerId,
    pub victim_id: PlayerId,
    /// Shooter's score after the hit, or `None` when the shooter already left.
    pub shooter_score: Option<u32>,
}

/// A projectile absorbed by a shield, which broke in the process.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedShot {
    pub projectile_id: ProjectileId,
    pub shooter_id: PlayerId,
    pub defender_id: PlayerId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub hits: Vec<Hit>,
    pub blocked: Vec<BlockedShot>,
    /// Projectiles dropped this tick, by collision or by leaving the playfield.
    pub removed: usize,
}

impl TickOutcome {
    /// Players whose shield broke this tick; their shield timers must be cancelled.
    pub fn broken_shields(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.blocked.iter().map(|b| b.defender_id)
    }
}

/// Live range is the open interval `(0, canvas_width)`. NaN counts as outside.
pub fn is_out_of_bounds(x: f32, canvas_width: f32) -> bool {
    !(x > 0.0 && x < canvas_width)
}

/// One simulation step: advance, collide, prune, compact.
pub fn tick_projectiles(
    players: &mut BTreeMap<PlayerId, Player>,
    projectiles: &mut Vec<Projectile>,
    canvas_width: f32,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    // Discrete step: one signed speed unit per tick.
    for p in projectiles.iter_mut() {
        p.x += p.speed;
    }

    // Projectile vs player collision (naive O(P*E), E <= 2).
    let mut to_remove: HashSet<ProjectileId> = HashSet::new();
    for p in projectiles.iter() {
        let targets: Vec<PlayerId> = players
            .values()
            .filter(|target| target.id != p.owner && target.contains(p.x, p.y))
            .map(|target| target.id)
            .collect();

        for target_id in targets {
            to_remove.insert(p.id);

            let Some(target) = players.get_mut(&target_id) else {
                continue;
            };

            if target.shield {
                target.shield = false;
                info!(
                    defender_id = target_id,
                    shooter_id = p.owner,
                    projectile_id = p.id,
                    word = %p.word,
                    "shield blocked shot"
                );
                outcome.blocked.push(BlockedShot {
                    projectile_id: p.id,
                    shooter_id: p.owner,
                    defender_id: target_id,
                });
                continue;
            }

            // The shooter may have disconnected while the word was in flight.
            let shooter_score = players.get_mut(&p.owner).map(|shooter| {
                shooter.score += 1;
                shooter.score
            });
            info!(
                victim_id = target_id,
                shooter_id = p.owner,
                projectile_id = p.id,
                word = %p.word,
                shooter_score = ?shooter_score,
                "player hit"
            );
            outcome.hits.push(Hit {
                projectile_id: p.id,
                shooter_id: p.owner,
                victim_id: target_id,
                shooter_score,
            });
        }

        if is_out_of_bounds(p.x, canvas_width) {
            to_remove.insert(p.id);
        }
    }

    let before = projectiles.len();
    projectiles.retain(|p| !to_remove.contains(&p.id));
    outcome.removed = before - projectiles.len();
    outcome
}
