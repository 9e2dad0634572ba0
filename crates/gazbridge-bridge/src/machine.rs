use std::time::Duration;

use gazbridge_frame::{DisplayFrame, IgnoreReason, StopTime, Token};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{BridgeConfig, HoldSeconds};
use crate::error::Result;
use crate::event::{BridgeEvent, RunState};
use crate::hold::HoldSlot;
use crate::scoreboard::Scoreboard;
use crate::ticker::Ticker;

/// Where a token was found; only changes the operator log prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Line,
    Chunk,
}

impl Origin {
    fn label(self) -> &'static str {
        match self {
            Origin::Line => "FDS",
            Origin::Chunk => "FDS token",
        }
    }
}

/// Outcome of feeding one token to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// IDLE -> RUNNING.
    Started,
    /// RUNNING -> IDLE with the final time shown.
    Stopped(StopTime),
    /// START while RUNNING; the run keeps its original start instant.
    AlreadyRunning,
    /// STOP while IDLE.
    StopWhileIdle,
    /// No state change.
    Ignored(IgnoreReason),
}

/// How much to tear down when the run is ended from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Source reached end of stream: stop ticking, let an armed hold fire.
    SourceEnded,
    /// Shutdown or source failure: stop ticking and cancel the hold.
    Teardown,
}

struct Inner {
    state: RunState,
    ticker: Option<Ticker>,
    hold: HoldSlot,
    hold_seconds: HoldSeconds,
}

/// The IDLE/RUNNING controller.
///
/// Every transition, including its side effects on the ticker, the final
/// frame and the hold, runs under one lock; callers never observe a
/// half-applied transition.
pub struct RunStateMachine {
    inner: Mutex<Inner>,
    scoreboard: Scoreboard,
    state_tx: watch::Sender<RunState>,
    cancel: CancellationToken,
    poll_interval: Duration,
    join_timeout: Duration,
}

impl RunStateMachine {
    pub fn new(scoreboard: Scoreboard, config: &BridgeConfig, cancel: CancellationToken) -> Self {
        let (state_tx, _) = watch::channel(RunState::Idle);
        Self {
            inner: Mutex::new(Inner {
                state: RunState::Idle,
                ticker: None,
                hold: HoldSlot::default(),
                hold_seconds: config.hold,
            }),
            scoreboard,
            state_tx,
            cancel,
            poll_interval: config.poll_interval,
            join_timeout: config.join_timeout,
        }
    }

    pub fn state(&self) -> RunState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Start instant of the current run, if RUNNING.
    pub async fn run_started(&self) -> Option<Instant> {
        self.inner.lock().await.ticker.as_ref().map(Ticker::started)
    }

    pub async fn hold_seconds(&self) -> HoldSeconds {
        self.inner.lock().await.hold_seconds
    }

    /// Change the hold for holds armed from now on.
    pub async fn configure(&self, hold: HoldSeconds) {
        self.inner.lock().await.hold_seconds = hold;
        self.scoreboard
            .events()
            .info(format!("Hold set to {hold}s"));
    }

    /// True while a clear is due.
    pub async fn hold_armed(&self) -> bool {
        self.inner.lock().await.hold.is_armed()
    }

    /// Apply one classified token.
    pub async fn apply(&self, token: &Token, origin: Origin) -> Transition {
        let events = self.scoreboard.events();
        let label = origin.label();
        let mut inner = self.inner.lock().await;

        match (inner.state, token) {
            (RunState::Idle, Token::Start) => {
                if let Err(err) = inner.hold.cancel(self.join_timeout).await {
                    events.error(err.to_string());
                }
                events.info(format!("{label}: C0 → start ticking"));
                inner.ticker = Some(Ticker::start(
                    self.scoreboard.clone(),
                    self.poll_interval,
                    &self.cancel,
                ));
                self.set_state(&mut inner, RunState::Running);
                Transition::Started
            }
            (RunState::Running, Token::Start) => {
                events.info(format!("{label}: C0 ignored (already running)"));
                Transition::AlreadyRunning
            }
            (RunState::Running, Token::Stop(time)) => {
                let time = *time;
                events.info(format!("{label}: c1 {time} → stop + send final"));
                if let Some(ticker) = inner.ticker.take() {
                    if let Err(err) = ticker.stop(self.join_timeout).await {
                        events.error(err.to_string());
                    }
                }
                self.set_state(&mut inner, RunState::Idle);

                match DisplayFrame::finish(time.seconds, time.centis) {
                    // A failed send is reported by `Scoreboard::show`.
                    Ok(frame) => {
                        let _ = self.scoreboard.show(&frame).await;
                    }
                    Err(err) => events.error(format!("final time {time} not displayable: {err}")),
                }

                let hold = inner.hold_seconds;
                events.info(format!("Hold final time for {hold}s, then clear to 0.00"));
                if let Err(err) = inner
                    .hold
                    .arm(
                        self.scoreboard.clone(),
                        hold.as_duration(),
                        &self.cancel,
                        self.join_timeout,
                    )
                    .await
                {
                    events.error(err.to_string());
                }
                Transition::Stopped(time)
            }
            (RunState::Idle, Token::Stop(time)) => {
                events.info(format!("{label}: c1 {time} ignored (not running)"));
                Transition::StopWhileIdle
            }
            (_, Token::Ignored(reason)) => {
                match reason {
                    IgnoreReason::StopWithoutTime => {
                        events.warn(format!("{label}: c1 found but no time parsed, ignored"))
                    }
                    IgnoreReason::UpperCaseStop => {
                        events.info(format!("{label}: C1 ignored by rule"))
                    }
                    IgnoreReason::NoMatch => debug!("no token"),
                }
                Transition::Ignored(*reason)
            }
        }
    }

    /// End the run from outside the token stream. Idempotent.
    pub async fn halt(&self, mode: Halt) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut outcome = Ok(());

        if let Some(ticker) = inner.ticker.take() {
            outcome = ticker.stop(self.join_timeout).await;
        }
        if mode == Halt::Teardown {
            let cancelled = inner.hold.cancel(self.join_timeout).await;
            outcome = outcome.and(cancelled);
        }
        if inner.state != RunState::Idle {
            self.set_state(&mut inner, RunState::Idle);
        }
        outcome
    }

    /// Wait until no clear is due any more.
    pub async fn settle(&self) {
        loop {
            let done = self.inner.lock().await.hold.done_signal();
            match done {
                Some(done) if !done.is_cancelled() => done.cancelled().await,
                _ => return,
            }
        }
    }

    fn set_state(&self, inner: &mut Inner, state: RunState) {
        inner.state = state;
        self.state_tx.send_replace(state);
        self.scoreboard.events().emit(BridgeEvent::StateChanged(state));
        debug!(%state, "run state changed");
    }
}

impl std::fmt::Debug for RunStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStateMachine")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
