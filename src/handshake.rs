//! The RFC 6455 §4 HTTP upgrade handshake, both sides.
//!
//! Both `accept` and `connect` hand back any bytes read past the
//! `\r\n\r\n` terminator: a client that pipelines its first WebSocket
//! frame immediately behind the HTTP response (or a server behind the
//! request) must not have that data silently dropped on the floor.

use base64::prelude::*;
use bytes::BytesMut;
use rand::RngCore;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Duration};

use crate::error::Error;
use crate::request::construct_http_request;

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
const MAX_HANDSHAKE_BYTES: usize = 16 * 1024;
const MAX_HEADERS: usize = 32;

/// The result of a completed handshake: the (now upgraded) stream, plus any
/// bytes read past the HTTP terminator that belong to the WebSocket framing
/// layer rather than the handshake.
pub struct Handshake<T> {
    pub stream: T,
    pub leftover: Vec<u8>,
}

pub fn generate_websocket_key() -> String {
    let mut key = [0u8; 16];
    rand::rng().fill_bytes(&mut key);
    BASE64_STANDARD.encode(key)
}

pub fn generate_accept_value(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64_STANDARD.encode(hasher.finalize())
}

fn header_contains_token(value: &str, token: &str) -> bool {
    value
        .split(',')
        .any(|part| part.trim().eq_ignore_ascii_case(token))
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

/// Reads from `stream` until `\r\n\r\n` is seen or `max_len` is exceeded.
/// Returns the buffer including any bytes read past the terminator.
async fn read_http_message<T>(stream: &mut T, max_len: usize) -> Result<BytesMut, Error>
where
    T: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        if find_terminator(&buf).is_some() {
            return Ok(buf);
        }
        if buf.len() > max_len {
            return Err(Error::IncompleteHTTPRequest);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::IncompleteHTTPRequest);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn find_header<'a>(headers: &'a [httparse::Header<'a>], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .and_then(|h| std::str::from_utf8(h.value).ok())
}

/// Server side of the handshake: reads an HTTP upgrade request off `stream`,
/// validates it, writes back the `101 Switching Protocols` response.
pub async fn accept<T>(mut stream: T, handshake_timeout: Duration) -> Result<Handshake<T>, Error>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let raw = timeout(
        handshake_timeout,
        read_http_message(&mut stream, MAX_HANDSHAKE_BYTES),
    )
    .await
    .map_err(|_| Error::HandshakeTimeout)??;

    let header_end = find_terminator(&raw).ok_or(Error::IncompleteHTTPRequest)?;

    let mut header_storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut header_storage);
    if request.parse(&raw[..header_end])?.is_partial() {
        return Err(Error::IncompleteHTTPRequest);
    }

    let connection = find_header(request.headers, "Connection").ok_or(Error::NoConnectionHeaderPresent)?;
    if !header_contains_token(connection, "upgrade") {
        return Err(Error::NoConnectionHeaderPresent);
    }

    let upgrade = find_header(request.headers, "Upgrade").ok_or(Error::NoUpgradeHeaderPresent)?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(Error::NoUpgradeHeaderPresent);
    }

    find_header(request.headers, "Host").ok_or(Error::NoHostHeaderPresent)?;

    let key = find_header(request.headers, "Sec-WebSocket-Key").ok_or(Error::NoSecWebsocketKey)?;
    let accept_value = generate_accept_value(key);

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Accept: {}\r\n\r\n",
        accept_value
    );
    timeout(handshake_timeout, stream.write_all(response.as_bytes()))
        .await
        .map_err(|_| Error::HandshakeTimeout)??;

    let leftover = raw[header_end..].to_vec();
    Ok(Handshake { stream, leftover })
}

/// Client side of the handshake: sends the upgrade request for `ws_url` over
/// `stream` and validates the server's `101` response, including comparing
/// `Sec-WebSocket-Accept` against the value derived from the key we sent.
pub async fn connect<T>(
    mut stream: T,
    ws_url: &str,
    handshake_timeout: Duration,
) -> Result<Handshake<T>, Error>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let key = generate_websocket_key();
    let (request, _host_with_port, _host, _use_tls) = construct_http_request(ws_url, &key)?;

    timeout(handshake_timeout, stream.write_all(request.as_bytes()))
        .await
        .map_err(|_| Error::HandshakeTimeout)??;

    let raw = timeout(
        handshake_timeout,
        read_http_message(&mut stream, MAX_HANDSHAKE_BYTES),
    )
    .await
    .map_err(|_| Error::HandshakeTimeout)??;

    let header_end = find_terminator(&raw).ok_or(Error::IncompleteHTTPRequest)?;

    let mut header_storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut header_storage);
    if response.parse(&raw[..header_end])?.is_partial() {
        return Err(Error::IncompleteHTTPRequest);
    }

    if response.code != Some(101) {
        return Err(Error::NoUpgrade);
    }

    let upgrade = find_header(response.headers, "Upgrade").ok_or(Error::NoUpgradeHeaderPresent)?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(Error::NoUpgradeHeaderPresent);
    }

    let accept = find_header(response.headers, "Sec-WebSocket-Accept").ok_or(Error::InvalidAcceptKey)?;
    if accept != generate_accept_value(&key) {
        return Err(Error::InvalidAcceptKey);
    }

    let leftover = raw[header_end..].to_vec();
    Ok(Handshake { stream, leftover })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn accept_value_matches_rfc6455_worked_example() {
        // The exact example quoted in RFC 6455 §1.3.
        assert_eq!(
            generate_accept_value("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[tokio::test]
    async fn full_handshake_round_trip() {
        let (client_io, server_io) = duplex(8 * 1024);

        let server = tokio::spawn(async move {
            accept(server_io, Duration::from_secs(5)).await.unwrap()
        });

        let client = connect(client_io, "ws://example.com/chat", Duration::from_secs(5))
            .await
            .unwrap();
        let handshake = server.await.unwrap();

        assert!(client.leftover.is_empty());
        assert!(handshake.leftover.is_empty());
    }

    #[tokio::test]
    async fn pipelined_frame_bytes_survive_as_leftover() {
        let (mut client_io, server_io) = duplex(8 * 1024);

        let server = tokio::spawn(async move {
            accept(server_io, Duration::from_secs(5)).await.unwrap()
        });

        let request = "GET /chat HTTP/1.1\r\nHost: example.com\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n";
        client_io.write_all(request.as_bytes()).await.unwrap();
        client_io.write_all(&[0x81, 0x00]).await.unwrap();

        let handshake = server.await.unwrap();
        assert_eq!(handshake.leftover, vec![0x81, 0x00]);
    }

    #[tokio::test]
    async fn missing_upgrade_header_is_rejected() {
        let (mut client_io, server_io) = duplex(8 * 1024);
        let server = tokio::spawn(async move { accept(server_io, Duration::from_secs(5)).await });

        let request = "GET /chat HTTP/1.1\r\nHost: example.com\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n";
        client_io.write_all(request.as_bytes()).await.unwrap();

        let result = server.await.unwrap();
        assert!(matches!(result, Err(Error::NoUpgradeHeaderPresent)));
    }
}
