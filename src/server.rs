use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::event::{generate_new_uuid, Event, EventStream};
use crate::frame::Role;
use crate::handshake::{self, Handshake};
use crate::stream::{self, Transport};
use futures::StreamExt;
use log::{info, warn};
use std::io::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;

/// Spawns a WebSocket server on `{address}:{port}` and returns an
/// `EventStream` the caller drives to learn about new clients, messages,
/// disconnects, and errors — all serialized through one channel so nothing
/// needs its own accept loop.
pub async fn start_server_with_config(
    address: &str,
    port: u16,
    config: Option<ServerConfig>,
) -> Result<EventStream, Error> {
    let listener = TcpListener::bind(format!("{}:{}", address, port)).await?;
    let (tx, rx) = mpsc::channel(1000);
    let config = config.unwrap_or_default();
    let websocket_config = config.websocket_config;
    let tls_config = config.tls_config;

    tokio::spawn(async move {
        loop {
            let uuid = generate_new_uuid();
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("accepted TCP connection from {addr}");
                    let tx = tx.clone();
                    let websocket_config = websocket_config.clone();
                    let tls_config = tls_config.clone();

                    tokio::spawn(async move {
                        if let Err(err) = stream::configure_keepalive(&stream, websocket_config.tcp_keepalive) {
                            warn!("failed to configure TCP keepalive for {addr}: {err}");
                        }

                        let transport = if let Some(tls_config) = tls_config {
                            let acceptor = TlsAcceptor::from(tls_config);
                            match acceptor.accept(stream).await {
                                Ok(tls_stream) => Transport::ServerTls(Box::new(tls_stream)),
                                Err(err) => {
                                    let _ = tx.send(Event::Error(uuid, err.into())).await;
                                    return;
                                }
                            }
                        } else {
                            Transport::Plain(stream)
                        };

                        let Handshake { stream: transport, leftover } = match handshake::accept(
                            transport,
                            websocket_config.handshake_timeout,
                        )
                        .await
                        {
                            Ok(handshake) => handshake,
                            Err(err) => {
                                warn!("handshake with {addr} failed: {err}");
                                let _ = tx.send(Event::Error(uuid, err)).await;
                                return;
                            }
                        };

                        let connection =
                            Connection::new(transport, Role::Server, websocket_config, leftover);
                        let (mut ws_reader, ws_writer) = connection.split();

                        let _ = tx.send(Event::NewClient(uuid, ws_writer)).await;

                        let mut closed_with_error = false;
                        while let Some(result) = ws_reader.next().await {
                            match result {
                                Ok(message) => {
                                    let _ = tx.send(Event::NewMessage(uuid, message)).await;
                                }
                                Err(err) => {
                                    let _ = tx.send(Event::Error(uuid, err)).await;
                                    closed_with_error = true;
                                    break;
                                }
                            }
                        }

                        // Error and Disconnect are both terminal for a
                        // connection; sending both would fire the
                        // callbacks adapter's on_close twice for one id.
                        if !closed_with_error {
                            let _ = tx.send(Event::Disconnect(uuid)).await;
                        }
                    });
                }
                Err(error) => {
                    let _ = tx.send(Event::Error(uuid, error.into())).await;
                }
            }
        }
    });

    Ok(EventStream::new(rx))
}

pub async fn start_server(address: &str, port: u16) -> Result<EventStream, Error> {
    start_server_with_config(address, port, None).await
}
