use std::pin::Pin;
use std::sync::Arc;

use gazbridge_frame::{DisplayFrame, FrameError, SinkWriter};
use tokio::io::AsyncWrite;

use crate::event::{BridgeEvent, EventBus, LogLevel};

/// Type-erased sink stream.
pub type BoxedSink = Pin<Box<dyn AsyncWrite + Send>>;

/// The shared output side: one [`SinkWriter`] plus observer notification.
///
/// Cloned into the ticker, the hold task and the state machine; all of them
/// funnel through the same writer lock.
#[derive(Clone)]
pub struct Scoreboard {
    sink: Arc<SinkWriter<BoxedSink>>,
    events: EventBus,
}

impl Scoreboard {
    pub fn new<W>(sink: W, events: EventBus) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let boxed: BoxedSink = Box::pin(sink);
        Self {
            sink: Arc::new(SinkWriter::new(boxed)),
            events,
        }
    }

    /// Send a frame and tell observers about the outcome.
    pub async fn show(&self, frame: &DisplayFrame) -> Result<(), FrameError> {
        match self.sink.send(frame).await {
            Ok(()) => {
                self.events
                    .emit(BridgeEvent::FrameSent(frame.as_str().to_string()));
                Ok(())
            }
            Err(err) => {
                self.events
                    .log_event(LogLevel::Error, format!("GAZ send error: {err}"));
                Err(err)
            }
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

impl std::fmt::Debug for Scoreboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoreboard").finish_non_exhaustive()
    }
}
