//! The callback-shaped surface (`on_open`/`on_message`/`on_close`) instead
//! of draining an `EventStream` by hand — the thin adapter `callbacks.rs`
//! builds over the same server primitives `echo_server` uses directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use halyard::callbacks::{open_server, DataType, ServerCallbacks};
use halyard::event::ConnectionId;
use halyard::split::WSWriter;
use log::{error, info};

struct EchoCallbacks {
    writers: Arc<Mutex<HashMap<ConnectionId, WSWriter>>>,
}

impl ServerCallbacks for EchoCallbacks {
    fn on_open(&mut self, id: ConnectionId, writer: WSWriter) {
        info!("client {id} connected");
        self.writers.lock().unwrap().insert(id, writer);
    }

    fn on_message(&mut self, id: ConnectionId, data_type: DataType, bytes: Vec<u8>) {
        let writers = self.writers.clone();
        tokio::spawn(async move {
            let mut writer = {
                let guard = writers.lock().unwrap();
                guard.get(&id).cloned()
            };
            if let Some(writer) = writer.as_mut() {
                let result = match data_type {
                    DataType::Text => {
                        writer.send_as_text(String::from_utf8_lossy(&bytes).into_owned()).await
                    }
                    DataType::Binary => writer.send_as_binary(bytes).await,
                };
                if result.is_err() {
                    error!("failed to echo message back to {id}");
                }
            }
        });
    }

    fn on_close(&mut self, id: ConnectionId) {
        info!("client {id} disconnected");
        self.writers.lock().unwrap().remove(&id);
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let callbacks = EchoCallbacks {
        writers: Arc::new(Mutex::new(HashMap::new())),
    };

    let server = open_server("0.0.0.0", 9002, None, callbacks)
        .await
        .expect("failed to bind server");
    info!("listening on 127.0.0.1:9002");

    // Keep the process alive; the server runs in its own background task.
    std::future::pending::<()>().await;
    drop(server);
}
