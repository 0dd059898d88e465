//! Sends one large text message as caller-driven fragments instead of a
//! single frame, demonstrating `send_fragmented_start`/`send_fragmented_cont`
//! (spec §6) rather than the single-frame `send`.

use futures::StreamExt;
use halyard::connect_async;
use halyard::frame::OpCode;
use log::{error, info};

#[tokio::main]
async fn main() {
    env_logger::init();

    let connection = match connect_async("ws://127.0.0.1:9002").await {
        Ok(connection) => connection,
        Err(err) => {
            error!("handshake failed: {err}");
            return;
        }
    };
    let (mut reader, mut writer) = connection.split();

    let chunks: Vec<&[u8]> = vec![b"hello, ", b"fragmented ", b"world"];
    let (first, rest) = chunks.split_first().expect("at least one chunk");

    writer
        .send_fragmented_start(first.to_vec(), OpCode::Text, false)
        .await
        .expect("failed to send first fragment");

    for (i, chunk) in rest.iter().enumerate() {
        let is_final = i == rest.len() - 1;
        writer
            .send_fragmented_cont(chunk.to_vec(), is_final)
            .await
            .expect("failed to send continuation fragment");
    }

    if let Some(Ok(message)) = reader.next().await {
        info!("echoed back: {}", message.as_text().unwrap_or_default());
    }
}
