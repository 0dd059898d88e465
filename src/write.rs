use crate::error::Error;
use crate::frame::{self, Frame, Role};
use crate::stream::Transport;
use rand::RngCore;
use tokio::io::{AsyncWriteExt, WriteHalf};

/// Writes frames to the wire, masking them when (and only when) this side of
/// the connection is a client. Exclusively owned (behind `Arc<Mutex<_>>>` at
/// the call sites) so concurrent `send`s never interleave one frame's bytes
/// with another's.
pub struct Writer {
    write_half: WriteHalf<Transport>,
    role: Role,
}

impl Writer {
    pub fn new(write_half: WriteHalf<Transport>, role: Role) -> Self {
        Self { write_half, role }
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        let mask = match self.role {
            Role::Client => Some(random_mask()),
            Role::Server => None,
        };
        let bytes = frame::serialize(&frame, mask);
        self.write_half.write_all(&bytes).await?;
        Ok(())
    }
}

fn random_mask() -> [u8; 4] {
    let mut key = [0u8; 4];
    rand::rng().fill_bytes(&mut key);
    key
}
