use std::time::Duration;

use gazbridge_frame::DisplayFrame;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::scoreboard::Scoreboard;

/// Slot for the single deferred clear.
///
/// Arming always cancels and joins the previous hold first, so two holds are
/// never armed at once.
#[derive(Default)]
pub(crate) struct HoldSlot {
    current: Option<PendingHold>,
}

struct PendingHold {
    cancel: CancellationToken,
    /// Cancelled when the hold task ends for any reason.
    done: CancellationToken,
    task: JoinHandle<()>,
}

impl HoldSlot {
    /// Arm a clear `hold` from now, superseding any armed hold.
    pub(crate) async fn arm(
        &mut self,
        scoreboard: Scoreboard,
        hold: Duration,
        parent: &CancellationToken,
        join_timeout: Duration,
    ) -> Result<()> {
        let superseded = self.cancel(join_timeout).await;

        let deadline = Instant::now() + hold;
        let cancel = parent.child_token();
        let done = CancellationToken::new();
        let task = tokio::spawn(hold_then_clear(
            scoreboard,
            deadline,
            cancel.clone(),
            done.clone(),
        ));
        self.current = Some(PendingHold { cancel, done, task });
        debug!(?hold, "hold armed");
        superseded
    }

    /// Cancel and join the armed hold, if any. A hold whose clear already
    /// went out is simply reaped.
    pub(crate) async fn cancel(&mut self, join_timeout: Duration) -> Result<()> {
        let Some(pending) = self.current.take() else {
            return Ok(());
        };
        pending.cancel.cancel();
        let abort = pending.task.abort_handle();
        match tokio::time::timeout(join_timeout, pending.task).await {
            Ok(_) => Ok(()),
            Err(_) => {
                abort.abort();
                warn!(?join_timeout, "hold did not stop in time, aborted");
                Err(BridgeError::JoinTimeout {
                    activity: "hold",
                    timeout: join_timeout,
                })
            }
        }
    }

    /// True while a clear is still due.
    pub(crate) fn is_armed(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|pending| !pending.done.is_cancelled())
    }

    /// Completion signal of the armed hold; resolves when it fires or is
    /// cancelled.
    pub(crate) fn done_signal(&self) -> Option<CancellationToken> {
        self.current.as_ref().map(|pending| pending.done.clone())
    }
}

async fn hold_then_clear(
    scoreboard: Scoreboard,
    deadline: Instant,
    cancel: CancellationToken,
    done: CancellationToken,
) {
    let _done = done.drop_guard();

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("hold cancelled before clear");
            return;
        }
        _ = tokio::time::sleep_until(deadline) => {}
    }

    if scoreboard.show(&DisplayFrame::clear()).await.is_ok() {
        scoreboard.events().info("Cleared display to 0.00");
    }
}
