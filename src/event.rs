use crate::error::Error;
use crate::message::Message;
use crate::split::WSWriter;
use futures::Stream;
use rand::RngCore;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Generates a fresh connection identifier, one per accepted client.
pub fn generate_new_uuid() -> Uuid {
    let mut buf = [0u8; 16];
    rand::rng().fill_bytes(&mut buf);
    Uuid::new_v8(buf)
}

/// One event surfaced by a running server or client to user code. This is
/// the lower-level channel primitive the `callbacks` module adapts into the
/// literal `on_open`/`on_message`/`on_close` dispatch contract.
pub enum Event {
    NewClient(ConnectionId, WSWriter),
    NewMessage(ConnectionId, Message),
    Disconnect(ConnectionId),
    Error(ConnectionId, Error),
}

// This struct will be used for implementing Stream trait. Thus, the end-user
// doesn't need to interact with the mpsc tokio channel directly
pub struct EventStream {
    receiver: Receiver<Event>,
}

impl EventStream {
    pub fn new(receiver: Receiver<Event>) -> Self {
        Self { receiver }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver).poll_recv(cx)
    }
}
