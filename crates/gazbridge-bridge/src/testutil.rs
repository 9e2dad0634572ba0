//! Test doubles shared by the bridge unit tests.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;

/// In-memory scoreboard. Clones share the captured bytes.
#[derive(Clone, Default)]
pub(crate) struct CaptureSink {
    data: Arc<Mutex<Vec<u8>>>,
    failing: Arc<AtomicBool>,
}

impl CaptureSink {
    /// Frames seen so far, CR stripped.
    pub(crate) fn frames(&self) -> Vec<String> {
        let data = self.data.lock().unwrap();
        String::from_utf8_lossy(&data)
            .split_terminator('\r')
            .map(str::to_string)
            .collect()
    }

    pub(crate) fn raw(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }

    /// Make every following write fail with `BrokenPipe`.
    pub(crate) fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl AsyncWrite for CaptureSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.failing.load(Ordering::SeqCst) {
            return Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        self.data.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Source stream fed from a channel: `Ok` bytes are delivered as-is, `Err`
/// surfaces as a read error, and dropping the sender gives EOF.
pub(crate) struct ScriptedSource {
    rx: mpsc::UnboundedReceiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
}

pub(crate) type SourceFeed = mpsc::UnboundedSender<io::Result<Vec<u8>>>;

pub(crate) fn scripted_source() -> (SourceFeed, ScriptedSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        tx,
        ScriptedSource {
            rx,
            pending: Vec::new(),
        },
    )
}

impl AsyncRead for ScriptedSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        while self.pending.is_empty() {
            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(bytes))) => self.pending = bytes,
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Err(err)),
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
        let n = self.pending.len().min(buf.remaining());
        buf.put_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Poll::Ready(Ok(()))
    }
}
