mod estimator;
mod quality;
mod status;
#[cfg(test)]
mod tests;

pub use estimator::{ClockSample, HealthCounters, HealthEstimator, HealthReport};
pub use quality::{QualityPolicy, QualityScore};
pub use status::{HeartbeatStatus, HeartbeatThresholds};
