use crate::domain::{AdmitError, PlayerId};
use crate::interface_adapters::protocol::{
    ClientMessage, GameStateDto, SERVER_FULL_MESSAGE, ServerMessage,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ArenaHandle, GameEvent};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    Rejected,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let arena = state.arena.clone();
    ws.on_upgrade(move |socket| {
        // Separate connection id for correlating logs before/after a player_id exists.
        let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
        handle_socket(socket, arena).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, arena: ArenaHandle) {
    let mut ctx = match bootstrap_connection(&mut socket, &arena).await {
        Ok(ctx) => ctx,
        Err(NetError::Rejected) => {
            info!("connection rejected: server full");
            return;
        }
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::ERROR, "bootstrap failed").await;
            return;
        }
    };

    tracing::Span::current().record("player_id", ctx.player_id);
    info!(player_id = ctx.player_id, "client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    // Serialize message safely; log JSON errors instead of panicking
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    ignored: u32,
    // Lag recovery snapshots sent to this client.
    lag_recovery_count: u64,
}

struct LogThrottle {
    input_full: Instant,
    world_lag: Instant,
    invalid_input: Instant,
}

impl LogThrottle {
    fn new() -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            input_full: now,
            world_lag: now,
            invalid_input: now,
        }
    }
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub world_latest_rx: watch::Receiver<Utf8Bytes>,
    pub stats: ConnStats,
    pub throttle: LogThrottle,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    arena: &ArenaHandle,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = arena.world_bytes_tx.subscribe();
    let world_latest_rx = arena.world_latest_tx.subscribe();

    // Seat assignment happens inside the world task so it is ordered with ticks.
    let welcome = match arena.join().await.map_err(|_| NetError::InputClosed)? {
        Ok(welcome) => welcome,
        Err(AdmitError::ServerFull) => {
            let msg = ServerMessage::Error {
                message: SERVER_FULL_MESSAGE.to_string(),
            };
            // Best effort: the client may already be gone.
            let _ = send_message(socket, &msg).await;
            let _ = send_close_with_reason(socket, close_code::POLICY, "server full").await;
            return Err(NetError::Rejected);
        }
    };
    let player_id = welcome.player_id;

    // Send Identity + Initial State
    // If the welcome cannot be delivered, compensate with Leave so the seat is not leaked.
    let welcome_msg = ServerMessage::Welcome {
        your_id: player_id,
        state: GameStateDto::from(&welcome.snapshot),
    };
    let sent = match send_message(socket, &welcome_msg).await {
        Ok(bytes) => bytes,
        Err(e) => {
            arena
                .input_tx
                .send(GameEvent::Leave { player_id })
                .await
                .map_err(|_| NetError::InputClosed)?; // InputClosed takes precedence
            return Err(e);
        }
    };

    Ok(ConnCtx {
        player_id,
        input_tx: arena.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        stats: ConnStats {
            msgs_out: 1,
            bytes_out: sent as u64,
            ..ConnStats::default()
        },
        throttle: LogThrottle::new(),
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        world_bytes_rx,
        world_latest_rx,
        stats,
        throttle,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, player_id, input_tx, stats, throttle) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing State Update
            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, stats).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut throttle.world_lag) {
                            warn!(missed = n, "state updates lagged; sending latest snapshot");
                        }

                        // Resync strategy: skip straight to the newest snapshot.
                        let latest = world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            stats.lag_recovery_count += 1;
                            match forward_world_bytes(latest, socket, stats).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(player_id, input_tx, stats).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    stats: &mut ConnStats,
    throttle: &mut LogThrottle,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                stats.msgs_in += 1;
                stats.bytes_in += text.len() as u64;

                // Malformed or unknown messages are dropped; they never end the session.
                let message = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => message,
                    Err(parse_err) => {
                        stats.invalid_json += 1;
                        if should_log(&mut throttle.invalid_input) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }
                        return Ok(LoopControl::Continue);
                    }
                };

                let Some(command) = message.into_command() else {
                    stats.ignored += 1;
                    debug!(player_id, "unknown message type ignored");
                    return Ok(LoopControl::Continue);
                };

                match input_tx.try_send(GameEvent::Command { player_id, command }) {
                    Ok(()) => Ok(LoopControl::Continue),
                    Err(mpsc::error::TrySendError::Full(_evt)) => {
                        if should_log(&mut throttle.input_full) {
                            warn!(player_id, "input channel full; dropping input");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
                }
            }
            Message::Binary(_) => {
                stats.ignored += 1;
                debug!(player_id, "binary message ignored");
                Ok(LoopControl::Continue)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            stats.msgs_out += 1;
            stats.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // A dead socket stops receiving; disconnect follows immediately.
            debug!(error = ?err, "failed to send state update");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    stats: &ConnStats,
) -> Result<(), NetError> {
    input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        ignored = stats.ignored,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}
