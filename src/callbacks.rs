//! The literal `on_open` / `on_message` / `on_close` surface (spec §6),
//! built as a thin adapter over the channel/`Stream`-shaped primitives the
//! rest of the crate actually uses (see DESIGN.md for why the callback
//! contract is kept but not the underlying mechanism).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::client::{connect_async, connect_async_with_config};
use crate::config::{ClientConfig, ServerConfig};
use crate::error::Error;
use crate::event::{ConnectionId, Event, EventStream};
use crate::message::Message;
use crate::server::start_server_with_config;
use crate::split::WSWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Text,
    Binary,
}

fn split_message(message: Message) -> (DataType, Vec<u8>) {
    match message {
        Message::Text(text) => (DataType::Text, text.into_bytes()),
        Message::Binary(data) => (DataType::Binary, data),
    }
}

/// Implemented by user code that wants callback-style dispatch for a
/// server's connections, keyed by [`ConnectionId`] since one `EventStream`
/// multiplexes every client.
pub trait ServerCallbacks: Send {
    fn on_open(&mut self, id: ConnectionId, writer: WSWriter);
    fn on_message(&mut self, id: ConnectionId, data_type: DataType, bytes: Vec<u8>);
    fn on_close(&mut self, id: ConnectionId);
}

async fn drive_server(mut events: EventStream, mut callbacks: impl ServerCallbacks) {
    while let Some(event) = events.next().await {
        match event {
            Event::NewClient(id, writer) => callbacks.on_open(id, writer),
            Event::NewMessage(id, message) => {
                let (data_type, bytes) = split_message(message);
                callbacks.on_message(id, data_type, bytes);
            }
            Event::Disconnect(id) => callbacks.on_close(id),
            Event::Error(id, _source) => callbacks.on_close(id),
        }
    }
}

/// A running server; dropping or [`close_server`]ing this stops the accept
/// loop and every connection it spawned.
pub struct Server {
    handle: JoinHandle<()>,
}

pub async fn open_server<C>(
    address: &str,
    port: u16,
    config: Option<ServerConfig>,
    callbacks: C,
) -> Result<Server, Error>
where
    C: ServerCallbacks + 'static,
{
    let events = start_server_with_config(address, port, config).await?;
    let handle = tokio::spawn(drive_server(events, callbacks));
    Ok(Server { handle })
}

pub fn close_server(server: Server) {
    server.handle.abort();
}

/// A single client connection, driven by a background task that calls
/// `on_message`/`on_close` as messages arrive; this handle is kept by the
/// caller only to send and to close. One handle type serves both the
/// `open_client` result and what `close_client` consumes, so callers never
/// juggle a separate reader/writer pair the way `Connection::split` does
/// for the `Stream`-based API.
pub struct ClientHandle {
    writer: WSWriter,
    connected: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl ClientHandle {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub async fn send(&mut self, message: Message) -> Result<(), Error> {
        self.writer.send_message(message).await
    }

    pub async fn send_fragmented_start(
        &mut self,
        data: Vec<u8>,
        opcode: crate::frame::OpCode,
        is_final: bool,
    ) -> Result<(), Error> {
        self.writer.send_fragmented_start(data, opcode, is_final).await
    }

    pub async fn send_fragmented_cont(&mut self, data: Vec<u8>, is_final: bool) -> Result<(), Error> {
        self.writer.send_fragmented_cont(data, is_final).await
    }
}

/// Dials `ws_url` and drives the resulting connection in the background,
/// invoking `on_open` once before any `on_message`, and `on_close` exactly
/// once after the connection ends for any reason (peer CLOSE, protocol
/// error, or transport failure).
pub async fn open_client<OnOpen, OnMessage, OnClose>(
    ws_url: &str,
    config: Option<ClientConfig>,
    on_open: OnOpen,
    mut on_message: OnMessage,
    mut on_close: OnClose,
) -> Result<ClientHandle, Error>
where
    OnOpen: FnOnce(),
    OnMessage: FnMut(DataType, Vec<u8>) + Send + 'static,
    OnClose: FnMut() + Send + 'static,
{
    let connection = match config {
        Some(config) => connect_async_with_config(ws_url, Some(config)).await?,
        None => connect_async(ws_url).await?,
    };
    on_open();

    let (mut reader, writer) = connection.split();
    let connected = Arc::new(AtomicBool::new(true));
    let task_connected = connected.clone();
    let reader_task = tokio::spawn(async move {
        while let Some(result) = reader.next().await {
            match result {
                Ok(message) => {
                    let (data_type, bytes) = split_message(message);
                    on_message(data_type, bytes);
                }
                Err(_) => break,
            }
        }
        task_connected.store(false, Ordering::SeqCst);
        on_close();
    });

    Ok(ClientHandle { writer, connected, reader_task })
}

pub async fn close_client(mut handle: ClientHandle, code: u16) -> Result<(), Error> {
    handle.writer.close_connection(code, &[]).await?;
    let _ = handle.reader_task.await;
    Ok(())
}
