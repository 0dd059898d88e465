//! The connection state machine (spec component F): HANDSHAKE -> OPEN ->
//! CLOSING -> CLOSED. `Connection` owns the transport, drives the reader
//! task, and exposes both a `Stream` of messages and a `split()` into
//! independent reader/writer halves — the two usage patterns the rest of
//! this crate's demos rely on.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::io::split as io_split;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::config::WebSocketConfig;
use crate::error::Error;
use crate::frame::Role;
use crate::message::Message;
use crate::read::ReadStream;
use crate::split::{WSReader, WSWriter};
use crate::stream::Transport;
use crate::write::Writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshake,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => ConnectionState::Handshake,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }

    fn tag(self) -> u8 {
        match self {
            ConnectionState::Handshake => 0,
            ConnectionState::Open => 1,
            ConnectionState::Closing => 2,
            ConnectionState::Closed => 3,
        }
    }
}

/// A shared, refcounted cell for the connection's current state: the server
/// connection set and the reader task both need to observe/advance it, and
/// neither owns it exclusively, so this is the shared-ownership primitive
/// spec §9 asks for in place of the source's manual refcounted blob.
#[derive(Clone)]
pub struct ConnectionStateCell(Arc<AtomicU8>);

impl ConnectionStateCell {
    fn new(state: ConnectionState) -> Self {
        Self(Arc::new(AtomicU8::new(state.tag())))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_tag(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: ConnectionState) {
        self.0.store(state.tag(), Ordering::SeqCst);
    }
}

/// One upgraded WebSocket connection, either side. Consume it directly as a
/// `Stream<Item = Result<Message, Error>>`, or call `split()` to hand the
/// write half to one task (e.g. a per-client registry) while another drains
/// the read half.
pub struct Connection {
    reader: WSReader,
    writer: WSWriter,
    state: ConnectionStateCell,
    local_close_initiated: Arc<AtomicBool>,
}

impl Connection {
    /// Spawns the reader task and returns a handle over `transport`, already
    /// in the OPEN state (the handshake itself has already completed by the
    /// time a `Transport` reaches this constructor).
    pub(crate) fn new(transport: Transport, role: Role, config: WebSocketConfig, leftover: Vec<u8>) -> Self {
        let (read_half, write_half) = io_split(transport);
        let writer = Arc::new(Mutex::new(Writer::new(write_half, role)));
        let (tx, rx) = mpsc::channel(128);
        let local_close_initiated = Arc::new(AtomicBool::new(false));

        let mut read_stream = ReadStream::new(
            read_half,
            role,
            leftover,
            tx,
            writer.clone(),
            config.clone(),
            local_close_initiated.clone(),
        );

        let state = ConnectionStateCell::new(ConnectionState::Open);
        let task_state = state.clone();
        tokio::spawn(async move {
            read_stream.poll_messages().await;
            task_state.set(ConnectionState::Closing);
            task_state.set(ConnectionState::Closed);
        });

        Self {
            reader: WSReader::new(ReceiverStream::new(rx)),
            writer: WSWriter::new(writer, config),
            state,
            local_close_initiated,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state(), ConnectionState::Open)
    }

    /// Sends a locally-initiated CLOSE and marks the connection CLOSING.
    /// Suppresses the reader's own echo if the peer's CLOSE arrives after.
    pub async fn close(&mut self, code: u16, reason: &[u8]) -> Result<(), Error> {
        self.local_close_initiated.store(true, Ordering::SeqCst);
        self.state.set(ConnectionState::Closing);
        self.writer.close_connection(code, reason).await
    }

    pub async fn send(&mut self, message: Message) -> Result<(), Error> {
        self.writer.send_message(message).await
    }

    /// Splits into independent halves. The caller now drives both
    /// lifetimes; the reader task keeps running regardless of how many
    /// `WSWriter` clones exist.
    pub fn split(self) -> (WSReader, WSWriter) {
        (self.reader, self.writer)
    }
}

impl Stream for Connection {
    type Item = Result<Message, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.reader).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake;
    use tokio::net::{TcpListener, TcpStream};

    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let (accept_result, connect_result) = tokio::join!(listener.accept(), connect);
        (accept_result.unwrap().0, connect_result.unwrap())
    }

    #[tokio::test]
    async fn short_masked_text_frame_is_delivered_as_one_message_s2() {
        let (server_stream, mut client_stream) = loopback_pair().await;

        let server = tokio::spawn(async move {
            let handshake::Handshake { stream, leftover } =
                handshake::accept(server_stream, std::time::Duration::from_secs(5))
                    .await
                    .unwrap();
            let config = WebSocketConfig::default();
            let mut connection = Connection::new(Transport::Plain(stream), Role::Server, config, leftover);
            use futures::StreamExt;
            connection.next().await
        });

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let handshake_request = "GET / HTTP/1.1\r\nHost: x\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n";
        client_stream.write_all(handshake_request.as_bytes()).await.unwrap();

        let mut response = [0u8; 4096];
        let _ = client_stream.read(&mut response).await.unwrap();

        client_stream
            .write_all(&[0x81, 0x85, 0x37, 0xFA, 0x21, 0x3D, 0x7F, 0x9F, 0x4D, 0x51, 0x58])
            .await
            .unwrap();

        let message = server.await.unwrap();
        assert_eq!(message, Some(Ok(Message::Text("Hello".into()))));
    }
}
