use std::fmt;

/// A finish time reported by the timing box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StopTime {
    pub seconds: u32,
    /// Always 0..=99.
    pub centis: u8,
}

impl StopTime {
    pub fn new(seconds: u32, centis: u8) -> Self {
        Self { seconds, centis }
    }
}

impl fmt::Display for StopTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.seconds, self.centis)
    }
}

/// One stop-time pattern, tried at every candidate digit position.
#[derive(Clone, Copy)]
pub struct TimeMatcher {
    pub name: &'static str,
    apply: fn(&[u8], usize) -> Option<StopTime>,
}

impl fmt::Debug for TimeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeMatcher").field("name", &self.name).finish()
    }
}

/// Stop-time patterns in priority order. The first pattern that matches
/// anywhere in the text wins; within a pattern the leftmost match wins.
///
/// 1. `SSSSS.DDdd`: 1-5 digits, `.` or `:`, at least 4 digits. Centiseconds
///    are the first two fraction digits (`00004.4800` is 4.48).
/// 2. `SSS.D` / `SSS.DD`: 1-3 digits, separator, 1-2 digits. A single
///    fraction digit is tenths (`7.5` is 7.50).
/// 3. `SSS`: 1-3 digits not followed by a digit or separator.
///
/// Reordering these changes which time a line yields.
pub const TIME_MATCHERS: [TimeMatcher; 3] = [
    TimeMatcher {
        name: "long-fraction",
        apply: match_long_fraction,
    },
    TimeMatcher {
        name: "short-fraction",
        apply: match_short_fraction,
    },
    TimeMatcher {
        name: "whole-seconds",
        apply: match_whole_seconds,
    },
];

/// Extract a stop time from raw source text.
///
/// Returns `None` when no pattern matches; callers must treat that as "no
/// time available", never as zero.
pub fn parse_time(text: &str) -> Option<StopTime> {
    parse_time_with_matcher(text).map(|(time, _)| time)
}

/// Like [`parse_time`], also naming the pattern that matched.
pub fn parse_time_with_matcher(text: &str) -> Option<(StopTime, &'static str)> {
    let bytes = text.as_bytes();
    let starts = candidate_starts(bytes);
    TIME_MATCHERS.iter().find_map(|matcher| {
        starts
            .iter()
            .find_map(|&start| (matcher.apply)(bytes, start))
            .map(|time| (time, matcher.name))
    })
}

/// Positions where a time may begin: every ASCII digit whose run is not
/// glued to a preceding letter. `c1`, `C0M` and `t0010` are tokens, not times.
fn candidate_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut glued = false;
    for (i, b) in bytes.iter().enumerate() {
        if !b.is_ascii_digit() {
            continue;
        }
        if i == 0 || !bytes[i - 1].is_ascii_digit() {
            glued = i > 0 && bytes[i - 1].is_ascii_alphabetic();
        }
        if !glued {
            starts.push(i);
        }
    }
    starts
}

fn digits_from(bytes: &[u8], start: usize) -> usize {
    bytes
        .get(start..)
        .map(|rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
        .unwrap_or(0)
}

fn is_separator(b: u8) -> bool {
    b == b'.' || b == b':'
}

fn separator_at(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos).copied().is_some_and(is_separator)
}

fn number(digits: &[u8]) -> u32 {
    digits
        .iter()
        .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'))
}

fn match_long_fraction(bytes: &[u8], start: usize) -> Option<StopTime> {
    let whole = digits_from(bytes, start);
    if whole == 0 || whole > 5 || !separator_at(bytes, start + whole) {
        return None;
    }
    let frac_start = start + whole + 1;
    let fraction = bytes.get(frac_start..frac_start + 4)?;
    if !fraction.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(StopTime {
        seconds: number(&bytes[start..start + whole]),
        centis: number(&fraction[..2]) as u8,
    })
}

fn match_short_fraction(bytes: &[u8], start: usize) -> Option<StopTime> {
    let whole = digits_from(bytes, start);
    if whole == 0 || whole > 3 || !separator_at(bytes, start + whole) {
        return None;
    }
    let frac_start = start + whole + 1;
    let frac_len = digits_from(bytes, frac_start).min(2);
    let centis = match frac_len {
        0 => return None,
        1 => number(&bytes[frac_start..frac_start + 1]) * 10,
        _ => number(&bytes[frac_start..frac_start + 2]),
    };
    Some(StopTime {
        seconds: number(&bytes[start..start + whole]),
        centis: centis as u8,
    })
}

fn match_whole_seconds(bytes: &[u8], start: usize) -> Option<StopTime> {
    let whole = digits_from(bytes, start);
    if whole == 0 || whole > 3 || separator_at(bytes, start + whole) {
        return None;
    }
    Some(StopTime {
        seconds: number(&bytes[start..start + whole]),
        centis: 0,
    })
}
