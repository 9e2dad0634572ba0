use std::fmt;

use crate::scanner::Segment;
use crate::time::{parse_time, StopTime};

/// Start marker; also matches variants such as `C0M`.
pub const START_MARKER: &str = "C0";

/// Stop marker. Only the lower-case form stops a run.
pub const STOP_MARKER: &str = "c1";

/// Upper-case stop variant the timing box also emits; never stops a run.
pub const IGNORED_STOP_MARKER: &str = "C1";

/// An event recognized in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Start,
    Stop(StopTime),
    Ignored(IgnoreReason),
}

/// Why a segment produced no actionable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `c1` was present but no time could be parsed.
    StopWithoutTime,
    /// Upper-case `C1`.
    UpperCaseStop,
    /// Neither marker present.
    NoMatch,
}

impl Token {
    /// Short lower-case name for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Start => "start",
            Token::Stop(_) => "stop",
            Token::Ignored(_) => "ignored",
        }
    }

    /// Parsed stop time, if any.
    pub fn time(&self) -> Option<StopTime> {
        match self {
            Token::Stop(time) => Some(*time),
            _ => None,
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::StopWithoutTime => "stop pattern seen, no time",
            IgnoreReason::UpperCaseStop => "upper-case C1 ignored by rule",
            IgnoreReason::NoMatch => "no token",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Start => f.write_str("start"),
            Token::Stop(time) => write!(f, "stop {time}"),
            Token::Ignored(reason) => write!(f, "ignored ({reason})"),
        }
    }
}

/// Classify one terminated line.
///
/// A line yields exactly one token. When both markers are present the stop
/// wins, since stopping is the safety-relevant action.
pub fn classify_line(text: &str) -> Token {
    if text.contains(STOP_MARKER) {
        return stop_token(text);
    }
    if text.contains(START_MARKER) {
        return Token::Start;
    }
    if text.contains(IGNORED_STOP_MARKER) {
        return Token::Ignored(IgnoreReason::UpperCaseStop);
    }
    Token::Ignored(IgnoreReason::NoMatch)
}

/// Classify an unterminated chunk, which may carry a start and a stop.
///
/// The start comes first and the stop-family token last, wherever their
/// markers sit in the chunk, so a chunk holding both always ends stopped.
pub fn classify_chunk(text: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(2);
    if text.contains(START_MARKER) {
        tokens.push(Token::Start);
    }
    if text.contains(STOP_MARKER) {
        tokens.push(stop_token(text));
    } else if text.contains(IGNORED_STOP_MARKER) {
        tokens.push(Token::Ignored(IgnoreReason::UpperCaseStop));
    }

    if tokens.is_empty() {
        tokens.push(Token::Ignored(IgnoreReason::NoMatch));
    }
    tokens
}

/// Classify any scanned segment.
pub fn classify(segment: &Segment) -> Vec<Token> {
    match segment {
        Segment::Line(text) => vec![classify_line(text)],
        Segment::Chunk(text) => classify_chunk(text),
    }
}

fn stop_token(text: &str) -> Token {
    match parse_time(text) {
        Some(time) => Token::Stop(time),
        None => Token::Ignored(IgnoreReason::StopWithoutTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_marker_and_variants() {
        assert_eq!(classify_line("C0"), Token::Start);
        assert_eq!(classify_line("0001 C0M 00000.0000 00"), Token::Start);
    }

    #[test]
    fn lower_case_stop_with_time() {
        assert_eq!(
            classify_line("c1 00012.3400"),
            Token::Stop(StopTime::new(12, 34))
        );
    }

    #[test]
    fn lower_case_stop_without_time_is_ignored() {
        assert_eq!(
            classify_line("c1"),
            Token::Ignored(IgnoreReason::StopWithoutTime)
        );
    }

    #[test]
    fn upper_case_stop_is_ignored() {
        assert_eq!(
            classify_line("C1 arrived"),
            Token::Ignored(IgnoreReason::UpperCaseStop)
        );
        assert_eq!(
            classify_line("0002 C1 00012.3400 00"),
            Token::Ignored(IgnoreReason::UpperCaseStop)
        );
    }

    #[test]
    fn start_marker_is_case_sensitive() {
        assert_eq!(classify_line("c0"), Token::Ignored(IgnoreReason::NoMatch));
    }

    #[test]
    fn noise_is_no_match() {
        assert_eq!(classify_line("n0001"), Token::Ignored(IgnoreReason::NoMatch));
    }

    #[test]
    fn stop_takes_precedence_in_a_line() {
        assert_eq!(
            classify_line("C0 c1 00009.1000"),
            Token::Stop(StopTime::new(9, 10))
        );
    }

    #[test]
    fn chunk_yields_start_then_stop_in_order() {
        let chunk = "xxxx C0M yyyy c1 00031.0700 zzzz";
        assert_eq!(
            classify_chunk(chunk),
            vec![Token::Start, Token::Stop(StopTime::new(31, 7))]
        );
    }

    #[test]
    fn chunk_stop_comes_last_even_when_written_first() {
        let chunk = "c1 00031.0700 C0M";
        assert_eq!(
            classify_chunk(chunk),
            vec![Token::Start, Token::Stop(StopTime::new(31, 7))]
        );
    }

    #[test]
    fn chunk_without_markers() {
        assert_eq!(
            classify_chunk("garbage"),
            vec![Token::Ignored(IgnoreReason::NoMatch)]
        );
    }

    #[test]
    fn segment_dispatch() {
        let line = Segment::Line("C0 c1 00001.0000".into());
        let chunk = Segment::Chunk("C0 c1 00001.0000".into());
        assert_eq!(classify(&line).len(), 1);
        assert_eq!(classify(&chunk).len(), 2);
    }

    #[test]
    fn token_accessors() {
        assert_eq!(Token::Start.kind(), "start");
        assert_eq!(Token::Stop(StopTime::new(1, 2)).time(), Some(StopTime::new(1, 2)));
        assert_eq!(Token::Ignored(IgnoreReason::NoMatch).time(), None);
        assert_eq!(
            Token::Ignored(IgnoreReason::StopWithoutTime).to_string(),
            "ignored (stop pattern seen, no time)"
        );
    }

    proptest::proptest! {
        #[test]
        fn classify_never_panics(text in ".*") {
            let _ = classify_line(&text);
            let tokens = classify_chunk(&text);
            proptest::prop_assert!(!tokens.is_empty() && tokens.len() <= 2);
        }
    }
}
