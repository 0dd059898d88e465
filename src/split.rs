use crate::config::WebSocketConfig;
use crate::error::Error;
use crate::frame::{Frame, OpCode};
use crate::message::Message;
use crate::write::Writer;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;

/// Read half of a connection, once split off: a `Stream` of reassembled
/// messages, each already past UTF-8/fragmentation validation.
pub struct WSReader {
    read_rx: ReceiverStream<Result<Message, Error>>,
}

impl WSReader {
    pub fn new(read_rx: ReceiverStream<Result<Message, Error>>) -> Self {
        Self { read_rx }
    }
}

impl Stream for WSReader {
    type Item = Result<Message, Error>;
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.read_rx).poll_next(cx)
    }
}

/// Write half of a connection, once split off. Cheaply `Clone`-able (it only
/// clones the `Arc<Mutex<Writer>>`), so a server can hand out one `WSWriter`
/// per registered client and keep writing to it from any task.
#[derive(Clone)]
pub struct WSWriter {
    pub writer: Arc<Mutex<Writer>>,
    pub config: WebSocketConfig,
}

impl WSWriter {
    pub fn new(writer: Arc<Mutex<Writer>>, config: WebSocketConfig) -> Self {
        Self { writer, config }
    }

    /// Sends a CLOSE frame and gives the peer a moment to respond before the
    /// caller tears the transport down.
    pub async fn close_connection(&mut self, code: u16, reason: &[u8]) -> Result<(), Error> {
        self.write_frames(vec![crate::control::build_close_frame(code, reason)])
            .await?;
        sleep(Duration::from_millis(500)).await;
        Ok(())
    }

    pub async fn send_message(&mut self, message: Message) -> Result<(), Error> {
        self.write_message(message).await
    }

    pub async fn send(&mut self, data: Vec<u8>) -> Result<(), Error> {
        self.write_message(Message::Text(String::from_utf8(data)?))
            .await
    }

    pub async fn send_as_binary(&mut self, data: Vec<u8>) -> Result<(), Error> {
        self.write_message(Message::Binary(data)).await
    }

    pub async fn send_as_text(&mut self, data: String) -> Result<(), Error> {
        self.write_message(Message::Text(data)).await
    }

    pub async fn send_ping(&mut self) -> Result<(), Error> {
        self.write_frames(vec![Frame::new(true, OpCode::Ping, Vec::new())])
            .await
    }

    /// Splits `data` into `fragment_size`-sized chunks and sends them as one
    /// fragmented message, in order. The convenience wrapper around
    /// `send_fragmented_start`/`send_fragmented_cont` for the common case of
    /// having the whole payload up front.
    pub async fn send_large_data_fragmented(
        &mut self,
        data: Vec<u8>,
        fragment_size: usize,
    ) -> Result<(), Error> {
        if fragment_size > self.config.max_frame_size {
            return Err(Error::CustomFragmentSizeExceeded(
                fragment_size,
                self.config.max_frame_size,
            ));
        }
        if data.len() > self.config.max_message_size {
            return Err(Error::MaxMessageSize);
        }

        let mut chunks = data.chunks(fragment_size).peekable();
        let Some(first) = chunks.next() else {
            return self
                .write_frames(vec![Frame::new(true, OpCode::Text, Vec::new())])
                .await;
        };
        self.send_fragmented_start(first.to_vec(), OpCode::Text, chunks.peek().is_none())
            .await?;
        while let Some(chunk) = chunks.next() {
            self.send_fragmented_cont(chunk.to_vec(), chunks.peek().is_none())
                .await?;
        }
        Ok(())
    }

    /// Sends the first fragment of a message the caller will continue
    /// fragment-by-fragment. `is_final` lets a single-fragment "fragmented"
    /// message (rare, but legal) close out immediately.
    pub async fn send_fragmented_start(
        &mut self,
        data: Vec<u8>,
        opcode: OpCode,
        is_final: bool,
    ) -> Result<(), Error> {
        self.write_frames(vec![Frame::new(is_final, opcode, data)])
            .await
    }

    /// Sends a continuation fragment. The caller is responsible for calling
    /// this with `is_final = true` exactly once, on the last chunk.
    pub async fn send_fragmented_cont(&mut self, data: Vec<u8>, is_final: bool) -> Result<(), Error> {
        self.write_frames(vec![Frame::new(is_final, OpCode::Continuation, data)])
            .await
    }

    fn convert_to_frames(&self, message: Message) -> Vec<Frame> {
        message.to_frames(self.config.max_frame_size)
    }

    async fn write_message(&mut self, message: Message) -> Result<(), Error> {
        if message.as_binary().len() > self.config.max_message_size {
            return Err(Error::MaxMessageSize);
        }
        let frames = self.convert_to_frames(message);
        self.write_frames(frames).await
    }

    async fn write_frames(&mut self, frames: Vec<Frame>) -> Result<(), Error> {
        let mut writer = self.writer.lock().await;
        for frame in frames {
            writer.write_frame(frame).await?;
        }
        Ok(())
    }
}
