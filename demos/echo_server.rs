//! Minimal echo server: every message a client sends comes straight back on
//! the same connection.
//!
//! Run with `cargo run --example echo_server`, then connect any WebSocket
//! client to `ws://127.0.0.1:9002`.

use std::collections::HashMap;

use futures::StreamExt;
use halyard::event::{ConnectionId, Event};
use halyard::server::start_server;
use halyard::split::WSWriter;
use log::{error, info};

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut events = start_server("0.0.0.0", 9002)
        .await
        .expect("failed to bind server");
    info!("listening on 127.0.0.1:9002");

    let mut writers: HashMap<ConnectionId, WSWriter> = HashMap::new();

    while let Some(event) = events.next().await {
        match event {
            Event::NewClient(id, writer) => {
                info!("client {id} connected");
                writers.insert(id, writer);
            }
            Event::NewMessage(id, message) => {
                if let Some(writer) = writers.get_mut(&id) {
                    if writer.send_message(message).await.is_err() {
                        error!("failed to echo message back to {id}");
                    }
                }
            }
            Event::Disconnect(id) => {
                info!("client {id} disconnected");
                writers.remove(&id);
            }
            Event::Error(id, err) => {
                error!("client {id} error: {err}");
                writers.remove(&id);
            }
        }
    }
}
