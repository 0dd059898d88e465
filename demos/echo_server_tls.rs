//! Same echo server as `echo_server`, wrapped in TLS. Expects `server.crt`
//! and `server.key` in the working directory (e.g. a self-signed pair
//! generated with `openssl req -x509 -newkey rsa:2048 -nodes ...`).

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind};
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use halyard::config::ServerConfig;
use halyard::event::{ConnectionId, Event};
use halyard::server::start_server_with_config;
use halyard::split::WSWriter;
use log::{error, info};
use pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::{certs, private_key};

fn load_certs(path: &Path) -> io::Result<Vec<CertificateDer<'static>>> {
    certs(&mut BufReader::new(File::open(path)?)).collect()
}

fn load_key(path: &Path) -> io::Result<PrivateKeyDer<'static>> {
    private_key(&mut BufReader::new(File::open(path)?))?
        .ok_or_else(|| io::Error::new(ErrorKind::Other, "no private key found"))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let certs = load_certs(Path::new("server.crt"))?;
    let key = load_key(Path::new("server.key"))?;

    let tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| io::Error::new(ErrorKind::InvalidInput, err))?;

    let config = ServerConfig {
        tls_config: Some(Arc::new(tls_config)),
        ..Default::default()
    };

    let mut events = start_server_with_config("0.0.0.0", 9002, Some(config))
        .await
        .expect("failed to bind server");
    info!("listening on 127.0.0.1:9002 (TLS)");

    let mut writers: HashMap<ConnectionId, WSWriter> = HashMap::new();

    while let Some(event) = events.next().await {
        match event {
            Event::NewClient(id, writer) => {
                info!("client {id} connected");
                writers.insert(id, writer);
            }
            Event::NewMessage(id, message) => {
                if let Some(writer) = writers.get_mut(&id) {
                    if writer.send_message(message).await.is_err() {
                        error!("failed to echo message back to {id}");
                    }
                }
            }
            Event::Disconnect(id) => {
                info!("client {id} disconnected");
                writers.remove(&id);
            }
            Event::Error(id, err) => {
                error!("client {id} error: {err}");
                writers.remove(&id);
            }
        }
    }

    Ok(())
}
