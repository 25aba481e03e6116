// Arena wiring: spawns the world task and hands out its channels.

use crate::use_cases::WorldUpdate;
use crate::use_cases::game::{WorldSettings, world_task};
use crate::use_cases::types::{GameEvent, JoinOutcome};
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use tokio::sync::{Notify, broadcast, mpsc, oneshot, watch};

/// Shared configuration for spawning the arena world.
#[derive(Debug, Clone, Copy)]
pub struct ArenaSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Tick interval, shield window and gameplay rules.
    pub world: WorldSettings,
}

/// Errors returned while talking to the world task.
#[derive(Debug)]
pub enum ArenaError {
    /// The world task stopped and no longer accepts events.
    Closed,
}

/// Channels into and out of the arena's world task.
#[derive(Clone)]
pub struct ArenaHandle {
    /// Sender for game events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    shutdown: Arc<Notify>,
}

impl ArenaHandle {
    /// Creates the channels and spawns the authoritative world loop.
    pub fn spawn(settings: ArenaSettings) -> Self {
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(world_task(
            input_rx,
            input_tx.clone(),
            world_tx.clone(),
            settings.world,
            shutdown.clone(),
        ));

        Self {
            input_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            shutdown,
        }
    }

    /// Asks the world task for a seat and waits for the answer.
    pub async fn join(&self) -> Result<JoinOutcome, ArenaError> {
        let (reply, answer) = oneshot::channel();
        self.input_tx
            .send(GameEvent::Join { reply })
            .await
            .map_err(|_| ArenaError::Closed)?;
        answer.await.map_err(|_| ArenaError::Closed)
    }

    /// Stops the world task; pending shield timers are dropped with it.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
