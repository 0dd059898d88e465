//! Async WebSocket protocol engine for the Tokio stack.
//!
//! This crate implements the handshake, framing, fragmentation, and close
//! handshake of [RFC 6455](https://datatracker.ietf.org/doc/html/rfc6455)
//! over a plain or TLS `tokio::net::TcpStream`, exposing both a
//! `Stream`-based API ([`Connection`], [`split::WSReader`]/
//! [`split::WSWriter`]) and a callback-based one ([`callbacks`]) for
//! wrapping a server or client into an application with minimal ceremony.

pub mod assembler;
pub mod callbacks;
pub mod client;
pub mod close;
pub mod config;
pub mod connection;
pub mod control;
pub mod error;
pub mod event;
pub mod frame;
pub mod handshake;
pub mod message;
mod read;
pub mod request;
pub mod server;
pub mod split;
pub mod stream;
pub mod utf8;
mod write;

pub use client::{connect_async, connect_async_with_config};
pub use config::{ClientConfig, ServerConfig, WebSocketConfig};
pub use connection::{Connection, ConnectionState};
pub use error::Error;
pub use event::{ConnectionId, Event, EventStream};
pub use message::Message;
pub use server::{start_server, start_server_with_config};
pub use split::{WSReader, WSWriter};
