use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::error::FrameError;

/// Unterminated bytes beyond this are scanned in place instead of waiting
/// for a line ending.
pub const DEFAULT_SCAN_THRESHOLD: usize = 128;

/// A piece of source text ready for token classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text up to (not including) a CR or LF.
    Line(String),
    /// Buffered text that never saw a line ending.
    Chunk(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Line(text) | Segment::Chunk(text) => text,
        }
    }

    pub fn is_chunk(&self) -> bool {
        matches!(self, Segment::Chunk(_))
    }
}

/// Splits the timing box byte stream into lines.
///
/// Lines end at the first CR or LF, whichever comes first. If no ending
/// shows up and more than `threshold` bytes are buffered, the whole buffer
/// is handed out as a [`Segment::Chunk`] and cleared, so devices that never
/// terminate lines still get their tokens seen.
#[derive(Debug, Clone)]
pub struct LineScanner {
    threshold: usize,
}

impl LineScanner {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for LineScanner {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_THRESHOLD)
    }
}

impl Decoder for LineScanner {
    type Item = Segment;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Segment>, FrameError> {
        loop {
            match src.iter().position(|b| *b == b'\r' || *b == b'\n') {
                Some(cut) => {
                    let line = src.split_to(cut);
                    src.advance(1);
                    let text = ascii_text(&line);
                    if text.is_empty() {
                        continue;
                    }
                    return Ok(Some(Segment::Line(text)));
                }
                None if src.len() > self.threshold => {
                    let chunk = src.split();
                    debug!(len = chunk.len(), "no line ending, scanning buffer in place");
                    let text = ascii_text(&chunk);
                    if text.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(Segment::Chunk(text)));
                }
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Segment>, FrameError> {
        if let Some(segment) = self.decode(src)? {
            return Ok(Some(segment));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split();
        let text = ascii_text(&rest);
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Segment::Chunk(text)))
    }
}

/// Decode as ASCII, dropping anything else.
fn ascii_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect()
}
