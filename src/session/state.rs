use crate::client::{CameraId, Resolution};
use crate::config::CamwatchConfig;
use crate::health::{
    HealthCounters, HealthEstimator, HeartbeatStatus, HeartbeatThresholds, QualityPolicy,
    QualityScore,
};
use crate::stats_view::StatsView;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Fixed parameters of a monitoring session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub base_url: String,
    pub thresholds: HeartbeatThresholds,
    pub policy: QualityPolicy,
    pub freshness: Duration,
    pub stats_refresh_delay: Duration,
    pub reconnect_delay: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &CamwatchConfig) -> Self {
        Self {
            base_url: config.server.base_url.clone(),
            thresholds: config.heartbeat.thresholds(),
            policy: config.quality.policy(),
            freshness: config.stats.freshness(),
            stats_refresh_delay: config.stats.refresh_delay(),
            reconnect_delay: config.stream.reconnect_delay(),
        }
    }
}

/// All mutable state of one session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,
    pub camera: CameraId,
    pub resolution: Resolution,
    pub stream_url: Option<String>,
    pub stats: StatsView,
    pub estimator: HealthEstimator,
    pub(super) last_cache_bust: i64,
    pub(super) reconnect_pending: bool,
}

impl SessionState {
    pub fn new(settings: &SessionSettings, now: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            camera: CameraId::default(),
            resolution: Resolution::default(),
            stream_url: None,
            stats: StatsView::default(),
            estimator: HealthEstimator::new(now, settings.thresholds, settings.policy),
            last_cache_bust: 0,
            reconnect_pending: false,
        }
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }
}

/// Read-only view of a session for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub session_id: Uuid,
    pub camera: CameraId,
    pub resolution: Resolution,
    pub layout_class: &'static str,
    pub stream_url: Option<String>,
    pub status: HeartbeatStatus,
    pub quality: QualityScore,
    pub quality_bar: String,
    pub seconds_since_frame: f64,
    pub counters: HealthCounters,
    pub stats: StatsView,
}

impl MonitorSnapshot {
    /// One-line summary for terminal output
    pub fn summary(&self) -> String {
        let mut line = format!(
            "cam {} | {} | {:<7} | {} | {} fps | {} frames | {} | {}",
            self.camera,
            self.resolution,
            self.status.label(),
            self.quality_bar,
            self.stats.fps,
            self.stats.frame_count,
            self.stats.frame_size,
            self.stats.activity
        );
        if let Some(clients) = &self.stats.client_count {
            line.push_str(&format!(" | clients {}", clients));
        }
        line
    }
}
