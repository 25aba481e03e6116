// Fan-out: serialize each snapshot once, then share the bytes with every connection.

use crate::interface_adapters::protocol::{GameStateDto, ServerMessage};
use crate::use_cases::{ArenaHandle, WorldUpdate};

use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, watch};
use tracing::{error, warn};

pub fn encode_state_update(update: &WorldUpdate) -> Result<Utf8Bytes, serde_json::Error> {
    let msg = ServerMessage::StateUpdate {
        state: GameStateDto::from(update),
    };
    serde_json::to_string(&msg).map(Utf8Bytes::from)
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let bytes = match encode_state_update(&update) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(
                            error = ?e,
                            tick = update.tick,
                            "failed to serialize state update"
                        );
                        continue;
                    }
                };

                // Store the latest bytes for lag recovery.
                let _ = world_latest_tx.send(bytes.clone());
                // No subscribers just means nobody is connected.
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_arena_serializer(arena: &ArenaHandle) {
    tokio::spawn(world_update_serializer(
        arena.world_tx.subscribe(),
        arena.world_bytes_tx.clone(),
        arena.world_latest_tx.clone(),
    ));
}
