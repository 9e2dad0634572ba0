//! Serial device transport for gazbridge.
//!
//! Opens the timing box and scoreboard tty devices raw 8N1 at a fixed baud
//! rate and exposes them as async duplex byte streams. Everything above this
//! crate only sees `AsyncRead + AsyncWrite`.

pub mod error;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use serial::{baud_constant, SerialPort, SUPPORTED_BAUD_RATES};
