// Framework bootstrap for the duel server runtime.

use crate::frameworks::config::ServerConfig;
use crate::interface_adapters::net::{spawn_arena_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::ArenaHandle;

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state(&config);
    // Start the Web Server
    // The socket is accepted on any path; `/ws` is kept for clients that use it.
    let app = Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(
        %address,
        tick_rate_hz = config.tick_rate_hz,
        canvas_width = config.canvas_width,
        projectile_speed = config.projectile_speed,
        shield_duration_ms = config.shield_duration.as_millis(),
        "listening"
    );

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = ServerConfig::from_env();
    let address = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}

fn build_state(config: &ServerConfig) -> Arc<AppState> {
    // Spawn the Game Loop (World Task) and its snapshot serializer.
    let arena = ArenaHandle::spawn(config.arena_settings());
    spawn_arena_serializer(&arena);

    Arc::new(AppState { arena })
}
