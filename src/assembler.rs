//! Fragmented-message reassembly (spec component 4.D).
//!
//! A text or binary message may arrive as one final frame or as a
//! `start fragment, 0+ continuation fragments, final continuation` run.
//! `MessageAssembler` holds the one fragmented message that may be in
//! flight at a time — RFC 6455 forbids interleaving a second data message
//! inside an unfinished one — and runs the incremental UTF-8 validator
//! across fragment boundaries for `Text` messages.

use crate::config::WebSocketConfig;
use crate::error::Error;
use crate::frame::{Frame, OpCode};
use crate::utf8::Utf8Validator;

#[derive(Debug, Clone, PartialEq)]
pub enum AssembledMessage {
    Text(String),
    Binary(Vec<u8>),
}

struct PendingMessage {
    opcode: OpCode,
    payload: Vec<u8>,
    utf8: Option<Utf8Validator>,
}

/// Holds the in-progress fragmented message, if any, for one connection.
pub struct MessageAssembler {
    pending: Option<PendingMessage>,
    max_message_size: usize,
}

impl MessageAssembler {
    pub fn new(config: &WebSocketConfig) -> Self {
        Self {
            pending: None,
            max_message_size: config.max_message_size,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Feeds one data (`Text`/`Binary`/`Continuation`) frame into the
    /// assembler. Returns `Some(message)` once `frame.final_fragment` closes
    /// out a complete message, `None` while reassembly is still in progress.
    pub fn push(&mut self, frame: Frame) -> Result<Option<AssembledMessage>, Error> {
        match frame.opcode {
            OpCode::Text | OpCode::Binary => {
                if self.pending.is_some() {
                    return Err(Error::InvalidFrameFragmentation);
                }
                let mut utf8 = (frame.opcode == OpCode::Text).then(Utf8Validator::new);
                if let Some(validator) = utf8.as_mut() {
                    validator.feed(&frame.payload).map_err(|_| Error::InvalidUtf8Sequence)?;
                }
                if frame.final_fragment {
                    return Ok(Some(self.finish(frame.opcode, frame.payload, utf8)?));
                }
                self.pending = Some(PendingMessage {
                    opcode: frame.opcode,
                    payload: frame.payload,
                    utf8,
                });
                Ok(None)
            }
            OpCode::Continuation => {
                let mut pending = self.pending.take().ok_or(Error::InvalidContinuationFrame)?;

                if pending.payload.len() + frame.payload.len() > self.max_message_size {
                    return Err(Error::MaxMessageSize);
                }

                if let Some(validator) = pending.utf8.as_mut() {
                    if let Err(_) = validator.feed(&frame.payload) {
                        return Err(Error::InvalidUtf8Sequence);
                    }
                }
                pending.payload.extend_from_slice(&frame.payload);

                if frame.final_fragment {
                    Ok(Some(self.finish(pending.opcode, pending.payload, pending.utf8)?))
                } else {
                    self.pending = Some(pending);
                    Ok(None)
                }
            }
            _ => unreachable!("control frames are not routed through the assembler"),
        }
    }

    fn finish(
        &mut self,
        opcode: OpCode,
        payload: Vec<u8>,
        utf8: Option<Utf8Validator>,
    ) -> Result<AssembledMessage, Error> {
        if payload.len() > self.max_message_size {
            return Err(Error::MaxMessageSize);
        }
        match opcode {
            OpCode::Text => {
                if !utf8.map(|v| v.is_complete()).unwrap_or(false) {
                    return Err(Error::InvalidUtf8Sequence);
                }
                let text = String::from_utf8(payload)?;
                Ok(AssembledMessage::Text(text))
            }
            OpCode::Binary => Ok(AssembledMessage::Binary(payload)),
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WebSocketConfig {
        WebSocketConfig::default()
    }

    #[test]
    fn single_final_frame_completes_immediately() {
        let mut assembler = MessageAssembler::new(&config());
        let frame = Frame::new(true, OpCode::Text, b"hello".to_vec());
        let message = assembler.push(frame).unwrap().unwrap();
        assert_eq!(message, AssembledMessage::Text("hello".into()));
        assert!(!assembler.in_progress());
    }

    #[test]
    fn three_fragment_binary_message_reassembles_in_order() {
        let mut assembler = MessageAssembler::new(&config());
        assert!(assembler
            .push(Frame::new(false, OpCode::Binary, vec![1, 2]))
            .unwrap()
            .is_none());
        assert!(assembler.in_progress());
        assert!(assembler
            .push(Frame::new(false, OpCode::Continuation, vec![3, 4]))
            .unwrap()
            .is_none());
        let message = assembler
            .push(Frame::new(true, OpCode::Continuation, vec![5]))
            .unwrap()
            .unwrap();
        assert_eq!(message, AssembledMessage::Binary(vec![1, 2, 3, 4, 5]));
        assert!(!assembler.in_progress());
    }

    #[test]
    fn utf8_boundary_split_across_fragments_is_valid_s3() {
        let mut assembler = MessageAssembler::new(&config());
        let euro = "€".as_bytes();
        assert!(assembler
            .push(Frame::new(false, OpCode::Text, euro[..1].to_vec()))
            .unwrap()
            .is_none());
        let message = assembler
            .push(Frame::new(true, OpCode::Continuation, euro[1..].to_vec()))
            .unwrap()
            .unwrap();
        assert_eq!(message, AssembledMessage::Text("€".into()));
    }

    #[test]
    fn invalid_utf8_split_across_fragments_is_rejected() {
        let mut assembler = MessageAssembler::new(&config());
        assembler
            .push(Frame::new(false, OpCode::Text, vec![0xE2]))
            .unwrap();
        let result = assembler.push(Frame::new(true, OpCode::Continuation, vec![0x28]));
        assert!(matches!(result, Err(Error::InvalidUtf8Sequence)));
    }

    #[test]
    fn data_frame_while_fragmented_message_in_progress_is_rejected() {
        let mut assembler = MessageAssembler::new(&config());
        assembler
            .push(Frame::new(false, OpCode::Text, b"partial".to_vec()))
            .unwrap();
        let result = assembler.push(Frame::new(true, OpCode::Binary, b"oops".to_vec()));
        assert!(matches!(result, Err(Error::InvalidFrameFragmentation)));
    }

    #[test]
    fn continuation_with_nothing_pending_is_rejected() {
        let mut assembler = MessageAssembler::new(&config());
        let result = assembler.push(Frame::new(true, OpCode::Continuation, b"?".to_vec()));
        assert!(matches!(result, Err(Error::InvalidContinuationFrame)));
    }

    #[test]
    fn message_exceeding_max_size_across_fragments_is_rejected() {
        let mut config = config();
        config.max_message_size = 4;
        let mut assembler = MessageAssembler::new(&config);
        assembler
            .push(Frame::new(false, OpCode::Binary, vec![0; 3]))
            .unwrap();
        let result = assembler.push(Frame::new(true, OpCode::Continuation, vec![0; 3]));
        assert!(matches!(result, Err(Error::MaxMessageSize)));
    }
}
