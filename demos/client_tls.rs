//! Same client as `client`, dialing a `wss://` endpoint. Verifies the
//! server's certificate against the `webpki-roots` bundle by default; pass a
//! custom `ClientConfig { tls_config: Some(..), .. }` to pin a private CA.

use futures::StreamExt;
use halyard::connect_async;
use halyard::message::Message;
use log::{error, info};
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::select;
use tokio::time::{interval, Duration};

fn generate_random_string() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

async fn run(addr: &str) {
    let mut connection = match connect_async(addr).await {
        Ok(connection) => connection,
        Err(err) => {
            error!("handshake failed: {err}");
            return;
        }
    };

    let mut ticker = interval(Duration::from_secs(5));
    let mut round_trips = 0;

    loop {
        select! {
            Some(result) = connection.next() => {
                match result {
                    Ok(message) => {
                        info!("received: {}", message.as_text().unwrap_or_default());
                        round_trips += 1;
                        if round_trips >= 3 {
                            let _ = connection.close(1000, b"done").await;
                            break;
                        }
                    }
                    Err(err) => {
                        error!("received error from the stream: {err}");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let payload = generate_random_string();
                if connection.send(Message::Text(payload)).await.is_err() {
                    error!("failed to send message");
                    break;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    run("wss://localhost:9002").await;
}
