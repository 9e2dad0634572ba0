use std::time::Duration;

use gazbridge_frame::{DisplayFrame, FrameError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::scoreboard::Scoreboard;

/// Background loop showing whole elapsed seconds while a run is active.
///
/// One ticker lives per run. It only reads its own start instant and never
/// touches run state.
pub(crate) struct Ticker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    started: Instant,
}

impl Ticker {
    /// Start ticking from now. `cancel` is the parent token; the ticker
    /// derives its own child from it.
    pub(crate) fn start(
        scoreboard: Scoreboard,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> Self {
        let started = Instant::now();
        let cancel = cancel.child_token();
        let task = tokio::spawn(tick_loop(
            scoreboard,
            started,
            poll_interval,
            cancel.clone(),
        ));
        Self {
            cancel,
            task,
            started,
        }
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    /// Stop and join. Once this returns `Ok`, no further tick can be sent.
    pub(crate) async fn stop(self, join_timeout: Duration) -> Result<()> {
        self.cancel.cancel();
        let abort = self.task.abort_handle();
        match tokio::time::timeout(join_timeout, self.task).await {
            Ok(_) => Ok(()),
            Err(_) => {
                abort.abort();
                warn!(?join_timeout, "ticker did not stop in time, aborted");
                Err(BridgeError::JoinTimeout {
                    activity: "ticker",
                    timeout: join_timeout,
                })
            }
        }
    }
}

async fn tick_loop(
    scoreboard: Scoreboard,
    started: Instant,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_emitted: Option<u64> = None;
    let mut overflow_reported = false;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        // Skipped seconds are not backfilled; only the latest is shown.
        let elapsed = started.elapsed().as_secs();
        if elapsed == 0 || last_emitted == Some(elapsed) {
            continue;
        }
        last_emitted = Some(elapsed);

        let seconds = u32::try_from(elapsed).unwrap_or(u32::MAX);
        match DisplayFrame::running(seconds) {
            Ok(frame) => {
                if cancel.is_cancelled() {
                    break;
                }
                // Reported by `Scoreboard::show`; the next second retries.
                let _ = scoreboard.show(&frame).await;
            }
            Err(err @ FrameError::OutOfRange { .. }) => {
                if !overflow_reported {
                    overflow_reported = true;
                    scoreboard
                        .events()
                        .warn(format!("elapsed time not displayable: {err}"));
                }
            }
            Err(err) => scoreboard.events().error(format!("tick failed: {err}")),
        }
    }

    debug!(last = ?last_emitted, "ticker stopped");
}
