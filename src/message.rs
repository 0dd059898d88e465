use crate::error::Error;
use crate::frame::{Frame, OpCode};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

impl Message {
    /// Converts a completed (already-reassembled) frame into a `Message`.
    pub fn from_frame(frame: Frame) -> Result<Self, Error> {
        match frame.opcode {
            OpCode::Text => Ok(Message::Text(String::from_utf8(frame.payload)?)),
            OpCode::Binary => Ok(Message::Binary(frame.payload)),
            _ => Err(Error::InvalidOpcode),
        }
    }

    pub fn as_binary(&self) -> Vec<u8> {
        match self {
            Message::Text(text) => text.as_bytes().to_vec(),
            Message::Binary(data) => data.clone(),
        }
    }

    pub fn as_text(&self) -> Result<String, Error> {
        match self {
            Message::Text(text) => Ok(text.clone()),
            Message::Binary(data) => Ok(String::from_utf8(data.clone())?),
        }
    }

    /// Splits this message into a sequence of frames no payload larger than
    /// `max_frame_size`, setting opcodes/FIN per RFC 6455 fragmentation
    /// rules: `Text`/`Binary` on the first frame, `Continuation` after, FIN
    /// only on the last.
    pub fn to_frames(self, max_frame_size: usize) -> Vec<Frame> {
        let opcode = match self {
            Message::Text(_) => OpCode::Text,
            Message::Binary(_) => OpCode::Binary,
        };

        let payload = match self {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(data) => data,
        };

        if payload.is_empty() {
            return vec![Frame::new(true, opcode, payload)];
        }

        let mut frames = Vec::new();
        for chunk in payload.chunks(max_frame_size) {
            let frame_opcode = if frames.is_empty() {
                opcode
            } else {
                OpCode::Continuation
            };
            frames.push(Frame::new(false, frame_opcode, chunk.to_vec()));
        }

        if let Some(last_frame) = frames.last_mut() {
            last_frame.final_fragment = true;
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_round_trips_through_a_frame() {
        let frame = Frame::new(true, OpCode::Text, b"hi".to_vec());
        let message = Message::from_frame(frame).unwrap();
        assert_eq!(message, Message::Text("hi".into()));
        assert_eq!(message.as_binary(), b"hi");
    }

    #[test]
    fn control_opcode_is_not_a_message() {
        let frame = Frame::new(true, OpCode::Ping, Vec::new());
        assert!(matches!(Message::from_frame(frame), Err(Error::InvalidOpcode)));
    }

    #[test]
    fn large_payload_splits_into_fragments_with_continuation_opcode() {
        let message = Message::Binary(vec![0u8; 10]);
        let frames = message.to_frames(4);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].opcode, OpCode::Binary);
        assert!(!frames[0].final_fragment);
        assert_eq!(frames[1].opcode, OpCode::Continuation);
        assert_eq!(frames[2].opcode, OpCode::Continuation);
        assert!(frames[2].final_fragment);
    }

    #[test]
    fn empty_payload_is_a_single_final_frame() {
        let frames = Message::Text(String::new()).to_frames(100);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].final_fragment);
    }
}
