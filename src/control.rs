//! Control-frame handling: PING/PONG/CLOSE (spec component 4.E).

use crate::close::is_valid_close_code;
use crate::error::Error;
use crate::frame::{Frame, OpCode};
use crate::utf8::is_valid_utf8;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlOutcome {
    /// A PING arrived; send this PONG back, carrying the same payload.
    Reply(Frame),
    /// A PONG arrived; nothing to do.
    Noop,
    /// A validated CLOSE arrived. The caller echoes `code`/`reason` in its
    /// own CLOSE frame (unless it already initiated the close) and then
    /// tears down the transport.
    PeerClose { code: u16, reason: Vec<u8> },
}

/// Dispatches one already-parsed control frame (`Ping`/`Pong`/`Close`).
pub fn handle_control(frame: Frame) -> Result<ControlOutcome, Error> {
    match frame.opcode {
        OpCode::Ping => Ok(ControlOutcome::Reply(Frame::new(
            true,
            OpCode::Pong,
            frame.payload,
        ))),
        OpCode::Pong => Ok(ControlOutcome::Noop),
        OpCode::Close => {
            let (code, reason) = parse_close_payload(&frame.payload)?;
            Ok(ControlOutcome::PeerClose { code, reason })
        }
        OpCode::Text | OpCode::Binary | OpCode::Continuation => {
            unreachable!("only control frames are routed to handle_control")
        }
    }
}

/// Validates a CLOSE frame's payload per spec §4.E: length 1 is a protocol
/// error, length 0 defaults to code 1000, and any reason text is validated
/// as UTF-8.
pub fn parse_close_payload(payload: &[u8]) -> Result<(u16, Vec<u8>), Error> {
    match payload.len() {
        0 => Ok((1000, Vec::new())),
        1 => Err(Error::InvalidCloseFrame),
        _ => {
            let code = u16::from_be_bytes([payload[0], payload[1]]);
            if !is_valid_close_code(code) {
                return Err(Error::InvalidCloseCode);
            }
            let reason = payload[2..].to_vec();
            if !reason.is_empty() && !is_valid_utf8(&reason) {
                return Err(Error::InvalidUtf8Sequence);
            }
            Ok((code, reason))
        }
    }
}

/// Builds the CLOSE frame we send, whether initiating or echoing.
pub fn build_close_frame(code: u16, reason: &[u8]) -> Frame {
    let mut payload = Vec::with_capacity(2 + reason.len());
    payload.extend_from_slice(&code.to_be_bytes());
    payload.extend_from_slice(reason);
    Frame::new(true, OpCode::Close, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_is_answered_with_matching_pong() {
        let ping = Frame::new(true, OpCode::Ping, b"keepalive".to_vec());
        let outcome = handle_control(ping).unwrap();
        assert_eq!(
            outcome,
            ControlOutcome::Reply(Frame::new(true, OpCode::Pong, b"keepalive".to_vec()))
        );
    }

    #[test]
    fn pong_is_a_noop() {
        let pong = Frame::new(true, OpCode::Pong, Vec::new());
        assert_eq!(handle_control(pong).unwrap(), ControlOutcome::Noop);
    }

    #[test]
    fn close_with_empty_payload_defaults_to_1000() {
        let close = Frame::new(true, OpCode::Close, Vec::new());
        let outcome = handle_control(close).unwrap();
        assert_eq!(
            outcome,
            ControlOutcome::PeerClose {
                code: 1000,
                reason: Vec::new()
            }
        );
    }

    #[test]
    fn close_echo_carries_the_code_s5() {
        let close = Frame::new(true, OpCode::Close, vec![0x03, 0xE8]);
        let outcome = handle_control(close).unwrap();
        assert_eq!(
            outcome,
            ControlOutcome::PeerClose {
                code: 1000,
                reason: Vec::new()
            }
        );
        let reply = build_close_frame(1000, &[]);
        assert_eq!(reply.payload, vec![0x03, 0xE8]);
    }

    #[test]
    fn close_payload_of_length_one_is_a_protocol_error() {
        let result = parse_close_payload(&[0x03]);
        assert!(matches!(result, Err(Error::InvalidCloseFrame)));
    }

    #[test]
    fn close_with_invalid_code_is_rejected() {
        let result = parse_close_payload(&[0x03, 0xEC]); // 1004, reserved
        assert!(matches!(result, Err(Error::InvalidCloseCode)));
    }

    #[test]
    fn close_with_invalid_utf8_reason_is_rejected() {
        let mut payload = vec![0x03, 0xE8];
        payload.extend_from_slice(&[0xFF]);
        let result = parse_close_payload(&payload);
        assert!(matches!(result, Err(Error::InvalidUtf8Sequence)));
    }
}
