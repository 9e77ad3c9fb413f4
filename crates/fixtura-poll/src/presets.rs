//! Fixed cadence/budget pairs for common waits.

use std::time::Duration;

/// Named (interval, deadline) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPreset {
    /// 50ms between attempts, 5s overall.
    Quick,
    /// 500ms between attempts, 30s overall.
    Standard,
    /// 5s between attempts, 5 minutes overall.
    Patient,
}

impl PollPreset {
    /// Pause between attempts.
    #[must_use]
    pub const fn interval(self) -> Duration {
        match self {
            Self::Quick => Duration::from_millis(50),
            Self::Standard => Duration::from_millis(500),
            Self::Patient => Duration::from_secs(5),
        }
    }

    /// Overall budget.
    #[must_use]
    pub const fn deadline(self) -> Duration {
        match self {
            Self::Quick => Duration::from_secs(5),
            Self::Standard => Duration::from_secs(30),
            Self::Patient => Duration::from_secs(300),
        }
    }
}
