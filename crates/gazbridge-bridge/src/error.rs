use std::time::Duration;

/// Errors that can occur while running the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Frame-level error (encoding or sink write).
    #[error("frame error: {0}")]
    Frame(#[from] gazbridge_frame::FrameError),

    /// A source is still being read; shut down or wait for it to end first.
    #[error("source reader already running")]
    AlreadyRunning,

    /// A background activity did not finish within its join timeout.
    #[error("{activity} did not stop within {timeout:?}")]
    JoinTimeout {
        activity: &'static str,
        timeout: Duration,
    },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
