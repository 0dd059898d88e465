//! Transport abstraction: a plain TCP socket or a TLS-wrapped one, unified
//! behind one `AsyncRead + AsyncWrite` type so the rest of the crate never
//! has to know which it is holding.

use std::pin::Pin;
use std::task::{Context, Poll};

use socket2::{SockRef, TcpKeepalive};
use tokio::io::{self, AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream as ClientTlsStream;
use tokio_rustls::server::TlsStream as ServerTlsStream;

/// Either side of a connection may be wrapped in TLS; client and server TLS
/// streams are distinct rustls types, so both get a variant.
pub enum Transport {
    Plain(TcpStream),
    ServerTls(Box<ServerTlsStream<TcpStream>>),
    ClientTls(Box<ClientTlsStream<TcpStream>>),
}

/// Configures `SO_KEEPALIVE` and its idle time on a raw TCP socket, ahead of
/// both the optional TLS wrap and the WebSocket handshake. `None` disables
/// keepalive probes entirely. Per spec, this lives on the transport, never
/// in the protocol engine.
pub fn configure_keepalive(tcp_stream: &TcpStream, keepalive: Option<std::time::Duration>) -> io::Result<()> {
    let socket = SockRef::from(tcp_stream);
    match keepalive {
        Some(idle) => socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle)),
        None => socket.set_keepalive(false),
    }
}

impl Transport {
    pub fn peer_addr(&self) -> io::Result<std::net::SocketAddr> {
        match self {
            Transport::Plain(stream) => stream.peer_addr(),
            Transport::ServerTls(stream) => stream.get_ref().0.peer_addr(),
            Transport::ClientTls(stream) => stream.get_ref().0.peer_addr(),
        }
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Transport::ServerTls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
            Transport::ClientTls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Transport::ServerTls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
            Transport::ClientTls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Transport::ServerTls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
            Transport::ClientTls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Transport::ServerTls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
            Transport::ClientTls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}
