//! Drives the frame codec against a growable accumulator fed from the wire,
//! dispatching completed frames to the control handler or message assembler.
//! This is the reader half of connection state machine (spec component F):
//! it owns the one assembly buffer and the one reassembly deadline a
//! connection may have in flight at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, ReadHalf};
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::assembler::{AssembledMessage, MessageAssembler};
use crate::config::WebSocketConfig;
use crate::control::{build_close_frame, handle_control, ControlOutcome};
use crate::error::Error;
use crate::frame::{self, Frame, HeaderOutcome, ParseOutcome, Role};
use crate::message::Message;
use crate::stream::Transport;
use crate::write::Writer;

/// Maps a protocol violation to the CLOSE code §7 of the spec says to send
/// for it. Everything not called out explicitly defaults to 1002, the
/// generic PROTOCOL_ERROR.
fn close_code_for_error(err: &Error) -> u16 {
    match err {
        Error::InvalidUtf8Sequence => 1007,
        Error::MaxFrameSize | Error::MaxMessageSize => 1011,
        _ => 1002,
    }
}

enum Step {
    NeedMore,
    Consumed,
    Stop,
}

pub struct ReadStream {
    read_half: ReadHalf<Transport>,
    role: Role,
    accumulator: BytesMut,
    assembler: MessageAssembler,
    reassembly_deadline: Option<Instant>,
    read_tx: Sender<Result<Message, Error>>,
    writer: Arc<Mutex<Writer>>,
    config: WebSocketConfig,
    local_close_initiated: Arc<AtomicBool>,
}

impl ReadStream {
    pub fn new(
        read_half: ReadHalf<Transport>,
        role: Role,
        leftover: Vec<u8>,
        read_tx: Sender<Result<Message, Error>>,
        writer: Arc<Mutex<Writer>>,
        config: WebSocketConfig,
        local_close_initiated: Arc<AtomicBool>,
    ) -> Self {
        let mut accumulator = BytesMut::with_capacity(4096);
        accumulator.extend_from_slice(&leftover);
        Self {
            read_half,
            role,
            accumulator,
            assembler: MessageAssembler::new(&config),
            reassembly_deadline: None,
            read_tx,
            writer,
            config,
            local_close_initiated,
        }
    }

    /// Runs until the peer closes the transport, a CLOSE handshake
    /// completes, or a protocol error forces the connection down. Errors
    /// are never returned to the caller — per spec §7 they surface only as
    /// a final `Err` item on the message channel, after this has already
    /// sent the appropriate CLOSE frame (best effort; the transport may
    /// already be gone).
    pub async fn poll_messages(&mut self) {
        let mut chunk = [0u8; 8192];
        loop {
            match self.try_parse_one().await {
                Ok(Step::Consumed) => continue,
                Ok(Step::Stop) => return,
                Ok(Step::NeedMore) => {}
                Err(err) => {
                    let code = close_code_for_error(&err);
                    let _ = self
                        .writer
                        .lock()
                        .await
                        .write_frame(build_close_frame(code, &[]))
                        .await;
                    let _ = self.read_tx.send(Err(err)).await;
                    return;
                }
            }

            if let Some(deadline) = self.reassembly_deadline {
                if Instant::now() >= deadline {
                    let _ = self.read_tx.send(Err(Error::ReassemblyTimeout)).await;
                    return;
                }
            }

            let n = match self.read_half.read(&mut chunk).await {
                Ok(n) => n,
                Err(source) => {
                    let _ = self.read_tx.send(Err(Error::IOError { source })).await;
                    return;
                }
            };
            if n == 0 {
                return;
            }
            self.accumulator.extend_from_slice(&chunk[..n]);
        }
    }

    async fn try_parse_one(&mut self) -> Result<Step, Error> {
        match frame::parse_header(self.role, &self.accumulator) {
            HeaderOutcome::NeedMore => return Ok(Step::NeedMore),
            HeaderOutcome::Error(err) => return Err(err),
            HeaderOutcome::Parsed { header, .. } => {
                if header.payload_len as usize > self.config.max_frame_size {
                    return Err(Error::MaxFrameSize);
                }
            }
        }

        let (frame, consumed) = match frame::parse(self.role, &self.accumulator) {
            ParseOutcome::NeedMore => return Ok(Step::NeedMore),
            ParseOutcome::Error(err) => return Err(err),
            ParseOutcome::Parsed { frame, consumed } => (frame, consumed),
        };
        let _ = self.accumulator.split_to(consumed);

        self.dispatch(frame).await
    }

    async fn dispatch(&mut self, frame: Frame) -> Result<Step, Error> {
        if frame.opcode.is_control() {
            return self.dispatch_control(frame).await;
        }

        if !self.assembler.in_progress() && !frame.final_fragment {
            self.reassembly_deadline = Some(Instant::now() + self.config.reassembly_timeout);
        }

        match self.assembler.push(frame)? {
            Some(AssembledMessage::Text(text)) => {
                self.reassembly_deadline = None;
                self.emit(Message::Text(text)).await
            }
            Some(AssembledMessage::Binary(data)) => {
                self.reassembly_deadline = None;
                self.emit(Message::Binary(data)).await
            }
            None => Ok(Step::Consumed),
        }
    }

    async fn dispatch_control(&mut self, frame: Frame) -> Result<Step, Error> {
        match handle_control(frame)? {
            ControlOutcome::Reply(pong) => {
                self.writer.lock().await.write_frame(pong).await?;
                Ok(Step::Consumed)
            }
            ControlOutcome::Noop => Ok(Step::Consumed),
            ControlOutcome::PeerClose { code, reason } => {
                if !self.local_close_initiated.swap(true, Ordering::SeqCst) {
                    self.writer
                        .lock()
                        .await
                        .write_frame(build_close_frame(code, &reason))
                        .await?;
                }
                Ok(Step::Stop)
            }
        }
    }

    async fn emit(&mut self, message: Message) -> Result<Step, Error> {
        self.read_tx
            .send(Ok(message))
            .await
            .map_err(|_| Error::CommunicationError)?;
        Ok(Step::Consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_code_mapping_matches_spec_table() {
        assert_eq!(close_code_for_error(&Error::InvalidUtf8Sequence), 1007);
        assert_eq!(close_code_for_error(&Error::MaxMessageSize), 1011);
        assert_eq!(close_code_for_error(&Error::RsvNotZero), 1002);
        assert_eq!(close_code_for_error(&Error::MaskingRuleViolation), 1002);
    }
}
