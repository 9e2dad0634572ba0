//! Wire formats on both sides of the bridge.
//!
//! - Source side: the timing box sends text lines (or unterminated chunks)
//!   carrying `C0` start tokens and lower-case `c1` stop tokens with a time.
//!   [`LineScanner`] splits the byte stream, [`classify`] turns each segment
//!   into [`Token`]s and [`parse_time`] extracts the finish time.
//! - Sink side: the scoreboard takes fixed 22-character ASCII frames, each
//!   followed by CR. [`DisplayFrame`] builds them and [`SinkWriter`] sends
//!   them one at a time.

pub mod codec;
pub mod error;
pub mod scanner;
pub mod time;
pub mod token;
pub mod writer;

pub use codec::{
    encode_frame, encode_no_dd, encode_with_dd, DisplayFrame, FRAME_LEN, HEADER_BELOW_100,
    HEADER_FROM_100, MAX_SECONDS, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use scanner::{LineScanner, Segment, DEFAULT_SCAN_THRESHOLD};
pub use time::{parse_time, parse_time_with_matcher, StopTime, TimeMatcher, TIME_MATCHERS};
pub use token::{
    classify, classify_chunk, classify_line, IgnoreReason, Token, IGNORED_STOP_MARKER,
    START_MARKER, STOP_MARKER,
};
pub use writer::SinkWriter;
