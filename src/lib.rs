pub mod app;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod health;
pub mod keyboard_input;
pub mod quality_bar;
pub mod session;
pub mod stats_view;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use app::{MonitorOrchestrator, ShutdownReason};
pub use client::{
    stream_url, ActionResponse, CameraId, CameraServerApi, HttpCameraClient, Resolution,
    StatsResponse, StreamStatsPayload,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CamwatchConfig;
pub use error::{CamwatchError, Result};
pub use events::{event_queue, ActionOutcome, Command, EventSender, MonitorEvent, StatsFailure};
pub use health::{
    ClockSample, HealthEstimator, HealthReport, HeartbeatStatus, HeartbeatThresholds,
    QualityPolicy, QualityScore,
};
pub use quality_bar::format_quality_bar;
pub use session::{MonitorSnapshot, SessionController, SessionSettings};
pub use stats_view::{StatsView, StreamActivity};
pub use stream::{mjpeg_frames, MjpegParser, StreamSink};
