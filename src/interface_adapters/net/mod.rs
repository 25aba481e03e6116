// Network adapter modules split by per-connection sockets vs the shared snapshot fan-out.

pub mod broadcast;
pub mod client;

pub use broadcast::spawn_arena_serializer;
pub use client::ws_handler;
