use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Header for times below 100 s (14 chars).
pub const HEADER_BELOW_100: &str = "  0   .       ";

/// Header for times of 100 s and above (12 chars).
pub const HEADER_FROM_100: &str = "  0   .     ";

/// Fixed tail after the fraction field.
pub const TAIL: &str = "00";

/// Logical frame length, without the CR terminator.
pub const FRAME_LEN: usize = 22;

/// Line ending required by the scoreboard after every frame.
pub const TERMINATOR: u8 = b'\r';

/// Largest value the display can show.
pub const MAX_SECONDS: u32 = 999;

/// One scoreboard frame, e.g. `"  0   .       49.00 00"`.
///
/// The frame text never contains the CR terminator; it is appended by
/// [`encode_frame`] when the frame goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    text: String,
}

impl DisplayFrame {
    /// A ticking frame: whole seconds, fraction field blank (`".   00"`).
    pub fn running(seconds: u32) -> Result<Self> {
        encode(seconds, None)
    }

    /// A finish frame with centiseconds (`".DD 00"`).
    pub fn finish(seconds: u32, centis: u8) -> Result<Self> {
        encode(seconds, Some(centis))
    }

    /// The zeroed frame shown after the hold elapses.
    pub fn clear() -> Self {
        let mut text = String::with_capacity(FRAME_LEN);
        text.push_str(HEADER_BELOW_100);
        text.push_str(" 0.00 ");
        text.push_str(TAIL);
        Self { text }
    }

    /// Frame text as sent, minus the terminator.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Frame length in characters, minus the terminator.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Frames are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Bytes on the wire: frame text plus CR.
    pub fn wire_size(&self) -> usize {
        self.text.len() + 1
    }

    /// Operator preview: spaces shown as `␣`, terminator as `⏎`.
    pub fn preview(&self) -> String {
        let mut out = self.text.replace(' ', "␣");
        out.push('⏎');
        out
    }

    /// Upper-case hex of the wire bytes, space separated.
    pub fn hex(&self) -> String {
        self.text
            .bytes()
            .chain(std::iter::once(TERMINATOR))
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build a frame without centiseconds.
pub fn encode_no_dd(seconds: u32) -> Result<DisplayFrame> {
    DisplayFrame::running(seconds)
}

/// Build a frame with centiseconds.
pub fn encode_with_dd(seconds: u32, centis: u8) -> Result<DisplayFrame> {
    DisplayFrame::finish(seconds, centis)
}

fn encode(seconds: u32, centis: Option<u8>) -> Result<DisplayFrame> {
    if seconds > MAX_SECONDS {
        return Err(FrameError::OutOfRange { seconds });
    }
    let fraction = match centis {
        Some(cs) if cs > 99 => return Err(FrameError::InvalidCentis(cs)),
        Some(cs) => format!("{cs:02} "),
        None => "   ".to_string(),
    };

    let mut text = String::with_capacity(FRAME_LEN);
    if seconds >= 100 {
        text.push_str(HEADER_FROM_100);
        text.push_str(&format!("{} {:02}", seconds / 100, seconds % 100));
    } else {
        text.push_str(HEADER_BELOW_100);
        text.push_str(&format!("{seconds:>2}"));
    }
    text.push('.');
    text.push_str(&fraction);
    text.push_str(TAIL);

    Ok(DisplayFrame { text })
}

/// Encode a frame into its wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────────┬──────────────┬──────────┬──────┬────┐
/// │ Header (14B or 12B)  │ SS or "H SS" │ ".DD " / │ "00" │ CR │
/// │ "  0   .  ..."       │              │ ".   "   │      │    │
/// └──────────────────────┴──────────────┴──────────┴──────┴────┘
/// ```
pub fn encode_frame(frame: &DisplayFrame, dst: &mut BytesMut) {
    dst.reserve(frame.wire_size());
    dst.put_slice(frame.as_str().as_bytes());
    dst.put_u8(TERMINATOR);
}
