// Use-case level inputs/outputs for the world task.

use crate::domain::{AdmitError, Player, PlayerCommand, PlayerId, Projectile};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum GameEvent {
    /// A connection asks for a seat; the answer comes back on `reply`.
    Join { reply: oneshot::Sender<JoinOutcome> },
    Leave { player_id: PlayerId },
    Command {
        player_id: PlayerId,
        command: PlayerCommand,
    },
    /// Posted by a shield timer task when its window elapsed.
    ShieldExpired { player_id: PlayerId, token: u64 },
}

pub type JoinOutcome = Result<Welcome, AdmitError>;

#[derive(Debug, Clone)]
pub struct Welcome {
    pub player_id: PlayerId,
    pub snapshot: WorldUpdate,
}

/// Full authoritative snapshot after a tick (or at admission time).
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub players: Vec<Player>,
    pub projectiles: Vec<Projectile>,
}
