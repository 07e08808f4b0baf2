use std::time::Duration;

/// How often the periodic scheduler checks when checks are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckInterval(Duration);

impl CheckInterval {
    pub const DEFAULT: Self = Self(Duration::from_secs(24 * 60 * 60));
    pub const MIN: Self = Self(Duration::from_secs(60 * 60));

    /// Intervals shorter than [`CheckInterval::MIN`] are clamped up.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs).max(Self::MIN.0))
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        self.0
    }

    #[must_use]
    pub fn as_secs(self) -> u64 {
        self.0.as_secs()
    }
}

impl Default for CheckInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}
