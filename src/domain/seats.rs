// Seat bookkeeping for the two-player room.

use super::state::{GameState, Player, PlayerId};
use super::tuning::Rules;

pub const MAX_PLAYERS: PlayerId = 2;

/// Errors returned when a connection asks for a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    /// Both seats were handed out since the room was last empty.
    ServerFull,
}

/// What happened to the room after a player left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The id did not hold a seat.
    Unknown,
    /// The player was removed; someone is still connected.
    Left,
    /// The last player left and the room was reset for a fresh match.
    RoomReset,
}

/// Hands out player ids from a counter that only rewinds once the room is empty.
#[derive(Debug)]
pub struct SeatRegistry {
    next_id: PlayerId,
}

impl Default for SeatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SeatRegistry {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates the next id and spawns its player. Nothing is created on rejection.
    pub fn admit(&mut self, state: &mut GameState, rules: &Rules) -> Result<PlayerId, AdmitError> {
        // A freed seat is not handed out again until everyone has left.
        if self.next_id > MAX_PLAYERS || state.players.len() >= usize::from(MAX_PLAYERS) {
            return Err(AdmitError::ServerFull);
        }

        let player_id = self.next_id;
        self.next_id += 1;
        state
            .players
            .insert(player_id, Player::spawn(player_id, &rules.player));
        Ok(player_id)
    }

    /// Removes the player's entry and resets derived state once the room is empty.
    pub fn release(&mut self, state: &mut GameState, player_id: PlayerId) -> Departure {
        if state.players.remove(&player_id).is_none() {
            return Departure::Unknown;
        }

        if state.players.is_empty() {
            state.projectiles.clear();
            self.next_id = 1;
            Departure::RoomReset
        } else {
            Departure::Left
        }
    }
}
