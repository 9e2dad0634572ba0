use std::fmt;
use std::time::Duration;

use gazbridge_frame::DEFAULT_SCAN_THRESHOLD;

/// How long the finish time stays on the display before it is cleared.
///
/// Always within 5..=10 seconds; out-of-range requests are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HoldSeconds(u8);

impl HoldSeconds {
    pub const MIN: u8 = 5;
    pub const MAX: u8 = 10;
    pub const DEFAULT: u8 = 7;

    /// Clamp `seconds` into the supported range.
    pub fn new(seconds: u64) -> Self {
        let clamped = seconds.clamp(u64::from(Self::MIN), u64::from(Self::MAX));
        Self(clamped as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for HoldSeconds {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for HoldSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bridge runtime configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Finish-time hold before clearing. Default: 7 s.
    pub hold: HoldSeconds,
    /// Ticker poll interval. Default: 50 ms.
    pub poll_interval: Duration,
    /// Unterminated bytes scanned in place past this size. Default: 128.
    pub scan_threshold: usize,
    /// Bound on joining a stopped activity. Default: 1 s.
    pub join_timeout: Duration,
    /// Observer channel capacity. Default: 256 events.
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hold: HoldSeconds::default(),
            poll_interval: Duration::from_millis(50),
            scan_threshold: DEFAULT_SCAN_THRESHOLD,
            join_timeout: Duration::from_secs(1),
            event_capacity: 256,
        }
    }
}
