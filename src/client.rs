//! The client-side entry point: dial a `ws://`/`wss://` URL and come back
//! with an upgraded [`Connection`].

use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig as RustlsClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::Error;
use crate::frame::Role;
use crate::handshake::{self, Handshake};
use crate::request::construct_http_request;
use crate::stream::{self, Transport};

pub async fn connect_async(ws_url: &str) -> Result<Connection, Error> {
    connect_async_with_config(ws_url, None).await
}

pub async fn connect_async_with_config(
    ws_url: &str,
    config: Option<ClientConfig>,
) -> Result<Connection, Error> {
    let config = config.unwrap_or_default();
    // Used only to resolve the dial target and scheme; handshake::connect
    // builds its own request with a freshly generated Sec-WebSocket-Key.
    let (_, host_with_port, host, use_tls) = construct_http_request(ws_url, "probe")?;

    let tcp = TcpStream::connect(&host_with_port).await?;
    stream::configure_keepalive(&tcp, config.websocket_config.tcp_keepalive)?;

    let transport = if use_tls {
        let tls_config = config
            .tls_config
            .clone()
            .unwrap_or_else(default_client_tls_config);
        let connector = TlsConnector::from(tls_config);
        let server_name = ServerName::try_from(host).map_err(Error::from)?.to_owned();
        let tls_stream = connector.connect(server_name, tcp).await?;
        Transport::ClientTls(Box::new(tls_stream))
    } else {
        Transport::Plain(tcp)
    };

    let Handshake { stream, leftover } = handshake::connect(
        transport,
        ws_url,
        config.websocket_config.handshake_timeout,
    )
    .await?;

    Ok(Connection::new(stream, Role::Client, config.websocket_config, leftover))
}

fn default_client_tls_config() -> Arc<RustlsClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        RustlsClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}
