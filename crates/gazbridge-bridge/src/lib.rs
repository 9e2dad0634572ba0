//! The FDS -> GAZ bridge runtime.
//!
//! [`Bridge`] reads timing events from a source stream and drives a
//! scoreboard sink:
//!
//! - `C0` starts a run; a ticker shows each elapsed second.
//! - `c1 <time>` stops it, shows the exact finish time, and after the
//!   configured hold clears the display to `0.00`.
//!
//! All state transitions go through [`RunStateMachine`]; observers follow
//! along through [`BridgeEvent`]s.

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
mod hold;
pub mod machine;
pub mod scoreboard;
mod session;
mod ticker;

#[cfg(test)]
mod testutil;

pub use bridge::Bridge;
pub use config::{BridgeConfig, HoldSeconds};
pub use error::{BridgeError, Result};
pub use event::{BridgeEvent, EventBus, LogLevel, RunState};
pub use machine::{Halt, Origin, RunStateMachine, Transition};
pub use scoreboard::{BoxedSink, Scoreboard};
