use super::shield_timers::ShieldTimers;
use super::types::{GameEvent, JoinOutcome, Welcome, WorldUpdate};
use crate::domain::{
    CommandEffect, Departure, GameState, PlayerCommand, PlayerId, Rules, SeatRegistry,
    apply_command,
};
use crate::systems::{TickOutcome, tick_projectiles};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{debug, info, warn};

// tokio intervals reject a zero period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
// Upper bound on events applied right before one tick.
const EVENTS_PER_TICK_BUDGET: usize = 1024;

/// Timing and rules for one world task.
#[derive(Debug, Clone, Copy)]
pub struct WorldSettings {
    pub tick_interval: Duration,
    pub shield_duration: Duration,
    pub rules: Rules,
}

/// Everything the world task owns. Only ever touched from that one task.
pub struct World {
    state: GameState,
    seats: SeatRegistry,
    timers: ShieldTimers,
    settings: WorldSettings,
    tick: u64,
}

impl World {
    pub fn new(settings: WorldSettings, timers: ShieldTimers) -> Self {
        Self {
            state: GameState::new(),
            seats: SeatRegistry::new(),
            timers,
            settings,
            tick: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn timers(&self) -> &ShieldTimers {
        &self.timers
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Join { reply } => {
                let outcome = self.join();
                if let Err(Ok(welcome)) = reply.send(outcome) {
                    // The socket went away while waiting; undo the admission.
                    self.leave(welcome.player_id);
                }
            }
            GameEvent::Leave { player_id } => self.leave(player_id),
            GameEvent::Command { player_id, command } => self.command(player_id, command),
            GameEvent::ShieldExpired { player_id, token } => {
                self.shield_expired(player_id, token)
            }
        }
    }

    pub fn join(&mut self) -> JoinOutcome {
        match self.seats.admit(&mut self.state, &self.settings.rules) {
            Ok(player_id) => {
                info!(player_id, "player joined");
                Ok(Welcome {
                    player_id,
                    snapshot: self.snapshot(),
                })
            }
            Err(e) => {
                warn!(players = self.state.players.len(), "join rejected: server full");
                Err(e)
            }
        }
    }

    pub fn leave(&mut self, player_id: PlayerId) {
        self.timers.cancel(player_id);
        match self.seats.release(&mut self.state, player_id) {
            Departure::Unknown => {}
            Departure::Left => info!(player_id, "player left"),
            Departure::RoomReset => {
                self.timers.cancel_all();
                info!(player_id, "player left; room empty, state reset");
            }
        }
    }

    pub fn command(&mut self, player_id: PlayerId, command: PlayerCommand) {
        match apply_command(&mut self.state, &self.settings.rules, player_id, command) {
            CommandEffect::Ignored => {}
            CommandEffect::ProjectileSpawned(projectile_id) => {
                let word = self
                    .state
                    .projectiles
                    .last()
                    .map(|p| p.word.as_str())
                    .unwrap_or_default();
                info!(player_id, projectile_id, word, "fired");
            }
            CommandEffect::ShieldRaised => {
                self.timers.arm(player_id, self.settings.shield_duration);
                info!(player_id, "shield raised");
            }
        }
    }

    pub fn shield_expired(&mut self, player_id: PlayerId, token: u64) {
        // Tokens of cancelled or replaced timers are dropped here.
        if !self.timers.take_expired(player_id, token) {
            return;
        }
        if self.state.expire_shield(player_id) {
            info!(player_id, "shield expired");
        }
    }

    /// Advances the simulation one step and returns the snapshot to broadcast.
    pub fn tick(&mut self) -> WorldUpdate {
        let outcome = tick_projectiles(
            &mut self.state.players,
            &mut self.state.projectiles,
            self.settings.rules.canvas_width,
        );
        self.settle(&outcome);

        self.tick += 1;
        self.snapshot()
    }

    fn settle(&mut self, outcome: &TickOutcome) {
        for defender_id in outcome.broken_shields() {
            self.timers.cancel(defender_id);
        }

        // Match end is decided by the clients; the server keeps scoring.
        let winning_score = self.settings.rules.player.winning_score;
        for hit in &outcome.hits {
            if hit.shooter_score == Some(winning_score) {
                info!(
                    player_id = hit.shooter_id,
                    score = winning_score,
                    "winning score reached"
                );
            }
        }
    }

    pub fn snapshot(&self) -> WorldUpdate {
        WorldUpdate {
            tick: self.tick,
            players: self.state.players.values().cloned().collect(),
            projectiles: self.state.projectiles.clone(),
        }
    }
}

pub async fn world_task(
    mut events_rx: mpsc::Receiver<GameEvent>,
    events_tx: mpsc::Sender<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    settings: WorldSettings,
    shutdown: Arc<Notify>,
) {
    let mut world = World::new(settings, ShieldTimers::new(events_tx));

    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(settings.tick_interval.max(MIN_TICK_INTERVAL));

    loop {
        tokio::select! {
            // A due tick goes before further events so a busy queue cannot stall it.
            biased;
            _ = shutdown.notified() => {
                info!("world task shutting down");
                break;
            }
            _ = interval.tick() => {
                // Inputs that arrived before the boundary belong to this tick.
                let drained = drain_queued(&mut world, &mut events_rx);
                if drained == EVENTS_PER_TICK_BUDGET {
                    debug!(drained, "event budget exhausted; ticking with a backlog");
                }
                // No receivers is fine: nobody is connected yet.
                let _ = world_tx.send(world.tick());
            }
            Some(event) = events_rx.recv() => {
                world.handle_event(event);
            }
        }
    }
}

fn drain_queued(world: &mut World, events_rx: &mut mpsc::Receiver<GameEvent>) -> usize {
    let mut drained = 0;
    while drained < EVENTS_PER_TICK_BUDGET {
        match events_rx.try_recv() {
            Ok(event) => {
                world.handle_event(event);
                drained += 1;
            }
            Err(_) => break,
        }
    }
    drained
}
