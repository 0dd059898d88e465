use crate::error::Error;
use url::Url;

/// Builds the client-side HTTP upgrade request for `ws_url`, carrying the
/// `Sec-WebSocket-Key` the caller generated for this handshake.
///
/// Returns `(request, host_with_port, host, use_tls)`: `host_with_port` is
/// what the caller dials with `TcpStream::connect`, `host` is what a TLS
/// client needs for SNI/certificate verification, and `use_tls` reflects
/// the URL scheme (`ws` vs `wss`).
pub fn construct_http_request(ws_url: &str, key: &str) -> Result<(String, String, String, bool), Error> {
    let parsed_url = Url::parse(ws_url)?;
    let mut use_tls = false;

    let http_port: u16 = match parsed_url.scheme() {
        "ws" => 80,
        "wss" => {
            use_tls = true;
            443
        }
        _ => return Err(Error::InvalidSchemeURL),
    };

    let host = parsed_url.host_str().ok_or(Error::URLNoHost)?;
    let port = parsed_url.port().unwrap_or(http_port);

    let request_host_field = match parsed_url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => String::from(host),
    };

    let host_with_port = format!("{}:{}", host, port);

    let request_path = match parsed_url.query() {
        Some(query) => format!("{}?{}", parsed_url.path(), query),
        None => parsed_url.path().to_string(),
    };

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Key: {}\r\nSec-WebSocket-Version: 13\r\n\r\n",
        request_path,
        request_host_field,
        key,
    );

    Ok((request, host_with_port, String::from(host), use_tls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_request_for_plain_ws_url() {
        let (request, host_with_port, host, use_tls) =
            construct_http_request("ws://example.com/chat", "dGhlIHNhbXBsZSBub25jZQ==").unwrap();
        assert!(request.starts_with("GET /chat HTTP/1.1\r\n"));
        assert!(request.contains("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n"));
        assert_eq!(host_with_port, "example.com:80");
        assert_eq!(host, "example.com");
        assert!(!use_tls);
    }

    #[test]
    fn builds_request_for_wss_url_with_explicit_port() {
        let (_, host_with_port, _, use_tls) =
            construct_http_request("wss://example.com:9443/ws", "key").unwrap();
        assert_eq!(host_with_port, "example.com:9443");
        assert!(use_tls);
    }

    #[test]
    fn rejects_non_websocket_scheme() {
        assert!(matches!(
            construct_http_request("http://example.com", "key"),
            Err(Error::InvalidSchemeURL)
        ));
    }
}
