use std::sync::{Arc, Mutex, PoisonError};

use gazbridge_frame::DisplayFrame;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{BridgeConfig, HoldSeconds};
use crate::error::{BridgeError, Result};
use crate::event::{BridgeEvent, EventBus, RunState};
use crate::machine::{Halt, RunStateMachine};
use crate::scoreboard::Scoreboard;
use crate::session::{read_source, SourceEnd};

struct Reader {
    cancel: CancellationToken,
    /// Cancelled when the reader task ends for any reason.
    done: CancellationToken,
    task: JoinHandle<()>,
}

/// A running FDS -> GAZ bridge.
///
/// Owns the scoreboard side for its whole life. A source is attached with
/// [`Bridge::attach`]; after the source ends or fails a new one can be
/// attached, which is how a reconnect works.
///
/// Dropping the bridge cancels every background activity.
pub struct Bridge {
    machine: Arc<RunStateMachine>,
    scoreboard: Scoreboard,
    events: EventBus,
    config: BridgeConfig,
    cancel: CancellationToken,
    reader: Mutex<Option<Reader>>,
}

impl Bridge {
    /// Set up the scoreboard side without a source.
    ///
    /// Must be called within a tokio runtime.
    pub fn new<W>(sink: W, config: BridgeConfig) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let events = EventBus::new(config.event_capacity);
        let scoreboard = Scoreboard::new(sink, events.clone());
        let cancel = CancellationToken::new();
        let machine = Arc::new(RunStateMachine::new(
            scoreboard.clone(),
            &config,
            cancel.clone(),
        ));

        Self {
            machine,
            scoreboard,
            events,
            config,
            cancel,
            reader: Mutex::new(None),
        }
    }

    /// Set up both sides and start reading immediately.
    pub fn start<R, W>(source: R, sink: W, config: BridgeConfig) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + 'static,
    {
        let bridge = Self::new(sink, config);
        bridge.attach(source)?;
        Ok(bridge)
    }

    /// Start the reader activity on `source`.
    ///
    /// Fails with [`BridgeError::AlreadyRunning`] while a previous source is
    /// still being read.
    pub fn attach<R>(&self, source: R) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut slot = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|r| !r.done.is_cancelled()) {
            return Err(BridgeError::AlreadyRunning);
        }

        let cancel = self.cancel.child_token();
        let done = CancellationToken::new();
        let task = tokio::spawn(reader_task(
            source,
            Arc::clone(&self.machine),
            self.events.clone(),
            self.config.scan_threshold,
            cancel.clone(),
            done.clone(),
        ));
        *slot = Some(Reader { cancel, done, task });
        Ok(())
    }

    /// Observe logs, sent frames, state changes and source lifecycle.
    ///
    /// Subscribe before [`Bridge::attach`] to see `SourceStarted`.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> RunState {
        self.machine.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.machine.watch_state()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Change the finish-time hold; takes effect at the next stop.
    pub async fn configure(&self, hold: HoldSeconds) {
        self.machine.configure(hold).await;
    }

    pub async fn hold_seconds(&self) -> HoldSeconds {
        self.machine.hold_seconds().await
    }

    /// Send a manual frame through the shared writer. Run state is untouched.
    pub async fn send_test_frame(&self, seconds: u32, centis: Option<u8>) -> Result<DisplayFrame> {
        let frame = match centis {
            Some(centis) => DisplayFrame::finish(seconds, centis)?,
            None => DisplayFrame::running(seconds)?,
        };
        self.events.info(format!("Test frame: {}", frame.preview()));
        self.scoreboard.show(&frame).await?;
        Ok(frame)
    }

    /// Resolves once the current reader activity has ended, or immediately
    /// if none is attached.
    pub async fn closed(&self) {
        let done = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| r.done.clone());
        if let Some(done) = done {
            done.cancelled().await;
        }
    }

    /// Let a pending clear go out, then shut down.
    pub async fn settle(&self) -> Result<()> {
        self.machine.settle().await;
        self.shutdown().await
    }

    /// Stop the reader, the ticker and any armed hold. Idempotent.
    ///
    /// The bridge stays usable: a new source may be attached afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let mut outcome = Ok(());
        if let Some(reader) = reader {
            reader.cancel.cancel();
            let abort = reader.task.abort_handle();
            let join_timeout = self.config.join_timeout;
            if tokio::time::timeout(join_timeout, reader.task).await.is_err() {
                abort.abort();
                warn!(?join_timeout, "source reader did not stop in time, aborted");
                outcome = Err(BridgeError::JoinTimeout {
                    activity: "source reader",
                    timeout: join_timeout,
                });
            }
        }

        let halted = self.machine.halt(Halt::Teardown).await;
        debug!("bridge shut down");
        outcome.and(halted)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

async fn reader_task<R>(
    source: R,
    machine: Arc<RunStateMachine>,
    events: EventBus,
    scan_threshold: usize,
    cancel: CancellationToken,
    done: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let _done = done.drop_guard();

    events.emit(BridgeEvent::SourceStarted);
    events.info("FDS connected");

    let end = read_source(source, Arc::clone(&machine), events.clone(), scan_threshold, cancel).await;

    let failed = match end {
        SourceEnd::Cancelled => {
            events.info("FDS disconnected");
            false
        }
        SourceEnd::Eof => {
            events.info("FDS: end of stream");
            if let Err(err) = machine.halt(Halt::SourceEnded).await {
                events.error(err.to_string());
            }
            false
        }
        SourceEnd::Failed(err) => {
            events.error(format!("FDS read error: {err}"));
            if let Err(err) = machine.halt(Halt::Teardown).await {
                events.error(err.to_string());
            }
            true
        }
    };

    events.emit(BridgeEvent::SourceStopped { failed });
}
