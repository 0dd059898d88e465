use rustls::ClientConfig as RustlsClientConfig;
use rustls::ServerConfig as RustlsServerConfig;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub websocket_config: WebSocketConfig,
    pub tls_config: Option<Arc<RustlsServerConfig>>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub websocket_config: WebSocketConfig,
    pub tls_config: Option<Arc<RustlsClientConfig>>,
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// A single frame's payload above this size is a protocol error.
    pub max_frame_size: usize,
    /// A reassembled message (the sum of its fragments) above this size is
    /// a protocol error, even if every individual fragment was legal.
    pub max_message_size: usize,
    /// Upper bound on how long the HTTP upgrade exchange is allowed to take.
    pub handshake_timeout: Duration,
    /// Upper bound on how long a fragmented message may stay in progress
    /// before the connection gives up on it (spec component 4.D).
    pub reassembly_timeout: Duration,
    /// `SO_KEEPALIVE` idle time for the underlying TCP socket, if set.
    pub tcp_keepalive: Option<Duration>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            max_frame_size: 16 << 20,
            max_message_size: 64 << 20,
            handshake_timeout: Duration::from_secs(30),
            reassembly_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(60)),
        }
    }
}
