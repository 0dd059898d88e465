use httparse::Error as HttpParseError;
use pki_types::InvalidDnsNameError;
use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;
use tokio::time::error::Elapsed;
use url::ParseError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("channel communication error")]
    CommunicationError,

    #[error("{source}")]
    Timeout {
        #[from]
        source: Elapsed,
    },

    #[error("IO error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("{source}")]
    FromUtf8Error {
        #[from]
        source: FromUtf8Error,
    },

    #[error("invalid UTF-8 sequence in a text payload")]
    InvalidUtf8Sequence,

    // Handshake errors
    #[error("Connection: Upgrade header missing in the request")]
    NoConnectionHeaderPresent,

    #[error("Upgrade: websocket header missing in the request")]
    NoUpgradeHeaderPresent,

    #[error("Host header missing in the request")]
    NoHostHeaderPresent,

    #[error("couldn't find Sec-WebSocket-Key header in the request")]
    NoSecWebsocketKey,

    #[error("server didn't upgrade the connection")]
    NoUpgrade,

    #[error("server didn't send a valid Sec-WebSocket-Accept key")]
    InvalidAcceptKey,

    #[error("handshake did not complete within the configured timeout")]
    HandshakeTimeout,

    // Framing errors
    #[error("RSV bit set without a negotiated extension")]
    RsvNotZero,

    #[error("control frames must not be fragmented")]
    ControlFramesFragmented,

    #[error("control frame payload exceeds 125 bytes")]
    ControlFramePayloadSize,

    #[error("masked/unmasked frame does not match the connection role")]
    MaskingRuleViolation,

    #[error("fragment_size `{0}` can't be greater than max_frame_size `{1}`")]
    CustomFragmentSizeExceeded(usize, usize),

    #[error("frame exceeds max_frame_size")]
    MaxFrameSize,

    #[error("message exceeds max_message_size")]
    MaxMessageSize,

    // Fragmentation / reassembly errors
    #[error("data frame arrived while a fragmented message is already in progress")]
    InvalidFrameFragmentation,

    #[error("continuation frame with no fragmented message in progress")]
    InvalidContinuationFrame,

    #[error("invalid opcode")]
    InvalidOpcode,

    #[error("reassembly did not complete within the configured timeout")]
    ReassemblyTimeout,

    // Close handling
    #[error("close frame with a 1-byte payload")]
    InvalidCloseFrame,

    #[error("invalid or reserved close code")]
    InvalidCloseCode,

    // HTTP / URL errors
    #[error("{source}")]
    URLParseError {
        #[from]
        source: ParseError,
    },

    #[error("invalid scheme in WebSocket URL, expected ws:// or wss://")]
    InvalidSchemeURL,

    #[error("URL has no host")]
    URLNoHost,

    #[error("{source}")]
    HttpParseError {
        #[from]
        source: HttpParseError,
    },

    #[error("incomplete HTTP request")]
    IncompleteHTTPRequest,

    #[error("{source}")]
    DomainError {
        #[from]
        source: InvalidDnsNameError,
    },
}
