use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Liveness of the stream derived from the time since the last confirmed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeartbeatStatus {
    Live,
    Delay,
    Error,
    Offline,
}

impl HeartbeatStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HeartbeatStatus::Live => "LIVE",
            HeartbeatStatus::Delay => "DELAY",
            HeartbeatStatus::Error => "ERROR",
            HeartbeatStatus::Offline => "OFFLINE",
        }
    }

    /// Indicator colour used by renderers
    pub fn indicator(&self) -> &'static str {
        match self {
            HeartbeatStatus::Live => "green",
            HeartbeatStatus::Delay => "yellow",
            HeartbeatStatus::Error => "red",
            HeartbeatStatus::Offline => "black",
        }
    }
}

impl fmt::Display for HeartbeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds of the DELAY, ERROR and OFFLINE bands.
///
/// Each band is half-open: `[delay_after, error_after)` is DELAY and so on, so an
/// elapsed time exactly on a boundary belongs to the later band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatThresholds {
    pub delay_after: Duration,
    pub error_after: Duration,
    pub offline_after: Duration,
}

impl HeartbeatThresholds {
    pub fn new(delay_after: Duration, error_after: Duration, offline_after: Duration) -> Self {
        Self {
            delay_after,
            error_after,
            offline_after,
        }
    }

    pub fn classify(&self, elapsed: Duration) -> HeartbeatStatus {
        if elapsed < self.delay_after {
            HeartbeatStatus::Live
        } else if elapsed < self.error_after {
            HeartbeatStatus::Delay
        } else if elapsed < self.offline_after {
            HeartbeatStatus::Error
        } else {
            HeartbeatStatus::Offline
        }
    }

    pub fn is_ordered(&self) -> bool {
        !self.delay_after.is_zero()
            && self.delay_after < self.error_after
            && self.error_after < self.offline_after
    }
}

impl Default for HeartbeatThresholds {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(1),
            Duration::from_secs(3),
            Duration::from_secs(5),
        )
    }
}
