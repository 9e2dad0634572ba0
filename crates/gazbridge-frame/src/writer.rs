use std::io::ErrorKind;

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::codec::{encode_frame, DisplayFrame};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Writes complete frames to the scoreboard.
///
/// Shared by every activity that displays something. Each frame is written
/// and flushed inside one critical section, so frames never interleave on
/// the wire. Failures are reported, never retried.
pub struct SinkWriter<W> {
    state: Mutex<SinkState<W>>,
}

struct SinkState<W> {
    inner: W,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> SinkWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            state: Mutex::new(SinkState {
                inner,
                buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            }),
        }
    }

    /// Write one CR-terminated frame and flush it.
    pub async fn send(&self, frame: &DisplayFrame) -> Result<()> {
        let mut state = self.state.lock().await;
        let SinkState { inner, buf } = &mut *state;

        buf.clear();
        encode_frame(frame, buf);

        if let Err(err) = write_fully(inner, &buf[..]).await {
            error!(frame = ?frame.as_str(), %err, "sink send failed");
            return Err(err);
        }

        info!(frame = ?frame.as_str(), "sent frame + CR");
        Ok(())
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.state.into_inner().inner
    }
}

async fn write_fully<W: AsyncWrite + Unpin>(inner: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]).await {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    loop {
        match inner.flush().await {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

impl<W> std::fmt::Debug for SinkWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkWriter").finish_non_exhaustive()
    }
}
