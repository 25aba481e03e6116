// Per-test duel servers and a thin WebSocket client around them.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{sync::mpsc, time::Duration};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use word_duel_server::ServerConfig;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// Every test gets its own room, so each one starts its own server.
pub fn spawn_server(config: ServerConfig) -> String {
    let (url_tx, url_rx) = mpsc::channel::<String>();
    // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            // Bind to an ephemeral port to avoid collisions with local services.
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            url_tx.send(format!("ws://{addr}/ws")).expect("publish url");
            word_duel_server::run(listener, config)
                .await
                .expect("server failed");
        });
    });

    // The listener is bound before the url is published, so connects queue up from here.
    url_rx
        .recv_timeout(RECV_TIMEOUT)
        .expect("server did not start in time")
}

pub fn fast_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        tick_rate_hz: 100,
        ..ServerConfig::default()
    }
}

pub async fn connect(url: &str) -> Client {
    let (client, _response) = connect_async(url).await.expect("websocket handshake");
    client
}

/// Next text frame as JSON; `None` once the server closed the socket.
pub async fn next_json(client: &mut Client) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("message in time")?;
        match msg {
            Ok(Message::Text(text)) => {
                return Some(serde_json::from_str(text.as_str()).expect("server sends json"));
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// Skips frames until one satisfies `pred`.
pub async fn wait_for(client: &mut Client, pred: impl Fn(&Value) -> bool) -> Value {
    loop {
        let msg = next_json(client).await.expect("connection open");
        if pred(&msg) {
            return msg;
        }
    }
}

pub async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("send to server");
}

pub async fn send_raw(client: &mut Client, text: &str) {
    client
        .send(Message::text(text.to_string()))
        .await
        .expect("send to server");
}

pub async fn leave(mut client: Client) {
    let _ = client.close(None).await;
    // Drain until the server acknowledges the close.
    while let Ok(Some(Ok(_))) = tokio::time::timeout(RECV_TIMEOUT, client.next()).await {}
}
