use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Perceived stream stability, always within `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityScore(u8);

impl QualityScore {
    pub const MIN: QualityScore = QualityScore(0);
    pub const MAX: QualityScore = QualityScore(100);

    /// Build a score, clamping anything above 100
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn raise(self, step: u8) -> Self {
        Self::new(self.0 as u32 + step as u32)
    }

    /// `max(floor, score - step)`. A score already under `floor` is lifted to it.
    pub fn lower(self, step: u8, floor: u8) -> Self {
        Self::new(self.0.saturating_sub(step).max(floor) as u32)
    }
}

impl Default for QualityScore {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for QualityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Additive recovery / stepped decay rule for the quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPolicy {
    /// Added when a frame arrived since the previous tick
    pub recover_step: u8,
    /// Gaps longer than this take the short-gap branch
    pub short_gap: Duration,
    pub short_gap_step: u8,
    /// Short gaps never push the score below this value
    pub short_gap_floor: u8,
    /// Gaps longer than this take the long-gap branch
    pub long_gap: Duration,
    pub long_gap_step: u8,
}

impl QualityPolicy {
    pub fn apply(&self, score: QualityScore, frame_received: bool, elapsed: Duration) -> QualityScore {
        if frame_received {
            score.raise(self.recover_step)
        } else if elapsed > self.long_gap {
            score.lower(self.long_gap_step, 0)
        } else if elapsed > self.short_gap {
            score.lower(self.short_gap_step, self.short_gap_floor)
        } else {
            score
        }
    }
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            recover_step: 5,
            short_gap: Duration::from_secs(1),
            short_gap_step: 5,
            short_gap_floor: 30,
            long_gap: Duration::from_secs(3),
            long_gap_step: 20,
        }
    }
}
