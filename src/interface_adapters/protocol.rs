// Wire protocol DTOs and conversions for the duel WebSocket.

use crate::domain::{Player, PlayerCommand, PlayerId, Projectile};
use crate::use_cases::WorldUpdate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SERVER_FULL_MESSAGE: &str = "server full, try again later";

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    // Sent once, right after a seat was assigned.
    Welcome {
        #[serde(rename = "yourId")]
        your_id: PlayerId,
        state: GameStateDto,
    },
    // Snapshot of the whole game, every tick.
    StateUpdate { state: GameStateDto },
    // Followed by a close frame.
    Error { message: String },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    InputFire {
        #[serde(default)]
        word: String,
    },
    InputShield,
    // Newer clients may send types this server does not know yet.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn into_command(self) -> Option<PlayerCommand> {
        match self {
            ClientMessage::InputFire { word } => Some(PlayerCommand::Fire { word }),
            ClientMessage::InputShield => Some(PlayerCommand::RaiseShield),
            ClientMessage::Unknown => None,
        }
    }
}

/// `{ players: { "<id>": {...} }, projectiles: [...] }`. Shield timers never go out.
#[derive(Debug, Clone, Serialize)]
pub struct GameStateDto {
    pub players: BTreeMap<String, PlayerDto>,
    pub projectiles: Vec<ProjectileDto>,
}

impl From<&WorldUpdate> for GameStateDto {
    fn from(update: &WorldUpdate) -> Self {
        Self {
            players: update
                .players
                .iter()
                .map(|p| (p.id.to_string(), PlayerDto::from(p)))
                .collect(),
            projectiles: update.projectiles.iter().map(ProjectileDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: u32,
    pub shield: bool,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            x: player.x,
            y: player.y,
            width: player.width,
            height: player.height,
            score: player.score,
            shield: player.shield,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileDto {
    pub id: String,
    pub word: String,
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

impl From<&Projectile> for ProjectileDto {
    fn from(projectile: &Projectile) -> Self {
        Self {
            id: projectile.id.to_string(),
            word: projectile.word.clone(),
            owner: projectile.owner,
            x: projectile.x,
            y: projectile.y,
            speed: projectile.speed,
        }
    }
}
