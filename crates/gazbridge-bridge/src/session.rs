use std::sync::Arc;

use futures_util::StreamExt;
use gazbridge_frame::{classify, FrameError, LineScanner, Segment};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::EventBus;
use crate::machine::{Origin, RunStateMachine};

/// Why the reader activity ended.
#[derive(Debug)]
pub(crate) enum SourceEnd {
    Cancelled,
    Eof,
    Failed(FrameError),
}

/// The reader activity: scan the source, classify, drive the state machine.
///
/// Segments are handled strictly in arrival order, one at a time.
pub(crate) async fn read_source<R>(
    source: R,
    machine: Arc<RunStateMachine>,
    events: EventBus,
    scan_threshold: usize,
    cancel: CancellationToken,
) -> SourceEnd
where
    R: AsyncRead + Unpin,
{
    let mut segments = FramedRead::new(source, LineScanner::new(scan_threshold));

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SourceEnd::Cancelled,
            next = segments.next() => next,
        };

        let segment = match next {
            Some(Ok(segment)) => segment,
            Some(Err(err)) => return SourceEnd::Failed(err),
            None => return SourceEnd::Eof,
        };

        let origin = match &segment {
            Segment::Line(text) => {
                events.info(format!("FDS: {text}"));
                Origin::Line
            }
            Segment::Chunk(text) => {
                debug!(len = text.len(), "scanning unterminated chunk");
                Origin::Chunk
            }
        };

        for token in classify(&segment) {
            if cancel.is_cancelled() {
                return SourceEnd::Cancelled;
            }
            let transition = machine.apply(&token, origin).await;
            debug!(%token, ?transition, "token applied");
        }
    }
}
