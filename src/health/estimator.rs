use super::quality::{QualityPolicy, QualityScore};
use super::status::{HeartbeatStatus, HeartbeatThresholds};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Monotonic instant of the last confirmed frame, as an offset from the clock origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ClockSample(Duration);

impl ClockSample {
    pub fn new(at: Duration) -> Self {
        Self(at)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Time from this sample to `now`; zero if `now` is earlier
    pub fn elapsed_at(&self, now: Duration) -> Duration {
        now.saturating_sub(self.0)
    }
}

/// Outcome of one heartbeat tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HeartbeatStatus,
    pub quality: QualityScore,
    pub elapsed: Duration,
}

/// Counters kept alongside the estimator state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthCounters {
    pub frames: u64,
    pub frame_bytes: u64,
    pub frame_errors: u64,
    pub server_confirmations: u64,
    pub ticks: u64,
}

/// Heartbeat classifier and quality smoother.
///
/// Frames and server confirmations only move the clock sample forward and latch
/// `frame_since_tick`. The quality rule runs once per [`HealthEstimator::tick`]
/// with that latch, which is then cleared, so recovery speed follows the tick
/// rate and not the frame rate.
#[derive(Debug, Clone)]
pub struct HealthEstimator {
    thresholds: HeartbeatThresholds,
    policy: QualityPolicy,
    last_frame: ClockSample,
    quality: QualityScore,
    last_status: HeartbeatStatus,
    frame_since_tick: bool,
    counters: HealthCounters,
}

impl HealthEstimator {
    /// Start a session at `now` with full quality
    pub fn new(now: Duration, thresholds: HeartbeatThresholds, policy: QualityPolicy) -> Self {
        Self {
            thresholds,
            policy,
            last_frame: ClockSample::new(now),
            quality: QualityScore::MAX,
            last_status: HeartbeatStatus::Live,
            frame_since_tick: false,
            counters: HealthCounters::default(),
        }
    }

    pub fn last_frame(&self) -> ClockSample {
        self.last_frame
    }

    pub fn quality(&self) -> QualityScore {
        self.quality
    }

    pub fn last_status(&self) -> HeartbeatStatus {
        self.last_status
    }

    pub fn counters(&self) -> &HealthCounters {
        &self.counters
    }

    pub fn thresholds(&self) -> HeartbeatThresholds {
        self.thresholds
    }

    pub fn elapsed_at(&self, now: Duration) -> Duration {
        self.last_frame.elapsed_at(now)
    }

    /// True when a frame or confirmation arrived since the last tick
    pub fn frame_since_tick(&self) -> bool {
        self.frame_since_tick
    }

    /// A frame arrived from the stream sink at `at`
    pub fn record_frame(&mut self, at: ClockSample, bytes: usize) {
        self.counters.frames += 1;
        self.counters.frame_bytes += bytes as u64;
        self.reconcile(at);
        self.frame_since_tick = true;
    }

    /// The stream sink failed. Neither the clock sample nor the latch changes;
    /// the gap keeps growing and the next ticks take the decay path.
    pub fn record_frame_error(&mut self) {
        self.counters.frame_errors += 1;
    }

    /// The server reports a frame at `at`
    pub fn record_server_confirmation(&mut self, at: ClockSample) {
        self.counters.server_confirmations += 1;
        self.reconcile(at);
        self.frame_since_tick = true;
    }

    /// Advance the last-frame sample; it never moves backwards
    fn reconcile(&mut self, at: ClockSample) {
        if at > self.last_frame {
            self.last_frame = at;
        } else {
            trace!(
                "Ignoring stale frame sample {:?} (current {:?})",
                at,
                self.last_frame
            );
        }
    }

    /// Apply the quality rule once with the gap measured at `now`
    fn update_quality(&mut self, frame_received: bool, now: Duration) -> QualityScore {
        let elapsed = self.last_frame.elapsed_at(now);
        let previous = self.quality;
        self.quality = self.policy.apply(previous, frame_received, elapsed);

        if previous != self.quality {
            debug!(
                "Quality {} -> {} (frame_received={}, elapsed={:.2}s)",
                previous,
                self.quality,
                frame_received,
                elapsed.as_secs_f64()
            );
        }

        self.quality
    }

    /// Classify without touching state
    pub fn status_at(&self, now: Duration) -> HeartbeatStatus {
        self.thresholds.classify(self.last_frame.elapsed_at(now))
    }

    /// Periodic heartbeat: classify the current gap and apply the quality rule
    /// with the frames latched since the previous tick
    pub fn tick(&mut self, now: Duration) -> HealthReport {
        let elapsed = self.last_frame.elapsed_at(now);
        let status = self.thresholds.classify(elapsed);
        let frame_received = std::mem::take(&mut self.frame_since_tick);
        let quality = self.update_quality(frame_received, now);

        self.last_status = status;
        self.counters.ticks += 1;

        HealthReport {
            status,
            quality,
            elapsed,
        }
    }
}
