//! Drive an ALGE GAZ scoreboard from FDS timing events.
//!
//! The timing box reports `C0` when a run starts and `c1 <time>` when it
//! stops. gazbridge ticks the elapsed seconds onto the scoreboard while the
//! run is live, shows the exact finish time, and clears the display after a
//! short hold.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial devices as async byte streams (Unix)
//! - [`frame`]: Scoreboard frames, source tokens and time parsing
//! - [`bridge`]: Run state machine, ticker, hold-and-clear and the `Bridge` facade

/// Re-export transport types.
pub mod transport {
    pub use gazbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gazbridge_frame::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use gazbridge_bridge::*;
}
