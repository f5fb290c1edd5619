use crate::client::StatsResponse;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const FPS_PLACEHOLDER: &str = "0.0";
const FRAME_COUNT_PLACEHOLDER: &str = "0";
const FRAME_SIZE_PLACEHOLDER: &str = "0 KB";

/// Server-side streaming state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamActivity {
    /// The server updated its stats within the freshness window
    Streaming,
    /// Stats exist but are stale
    Disconnected,
    /// No stream statistics at all
    Idle,
    /// The last poll failed
    Error,
}

impl StreamActivity {
    pub fn text(&self) -> &'static str {
        match self {
            StreamActivity::Streaming => "streaming",
            StreamActivity::Disconnected => "disconnected",
            StreamActivity::Idle => "idle",
            StreamActivity::Error => "error",
        }
    }
}

impl fmt::Display for StreamActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Display-ready server statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub server_camera: Option<u8>,
    pub server_resolution: Option<String>,
    pub codec: Option<String>,
    pub encoder_quality: Option<String>,
    /// `active/max`, only once the server reports both
    pub client_count: Option<String>,
    pub fps: String,
    pub frame_count: String,
    pub frame_size: String,
    pub activity: StreamActivity,
}

impl Default for StatsView {
    fn default() -> Self {
        Self {
            server_camera: None,
            server_resolution: None,
            codec: None,
            encoder_quality: None,
            client_count: None,
            fps: FPS_PLACEHOLDER.to_string(),
            frame_count: FRAME_COUNT_PLACEHOLDER.to_string(),
            frame_size: FRAME_SIZE_PLACEHOLDER.to_string(),
            activity: StreamActivity::Idle,
        }
    }
}

impl StatsView {
    /// Fold a stats response into the view.
    ///
    /// Returns the age of the server's last frame when it is younger than
    /// `freshness`, meaning the server vouches for a live stream.
    pub fn apply(&mut self, response: &StatsResponse, unix_now: f64, freshness: Duration) -> Option<Duration> {
        self.server_camera = Some(response.current_camera);
        self.server_resolution = Some(response.resolution.clone());
        if response.codec.is_some() {
            self.codec = response.codec.clone();
        }
        if response.quality.is_some() {
            self.encoder_quality = response.quality.clone();
        }
        if let (Some(active), Some(max)) = (response.active_clients, response.max_clients) {
            self.client_count = Some(format!("{}/{}", active, max));
        }

        let Some(stats) = response.stream_stats() else {
            self.reset_metrics();
            self.activity = StreamActivity::Idle;
            return None;
        };

        self.fps = match stats.fps {
            Some(fps) if fps > 0.0 => fps.to_string(),
            _ => FPS_PLACEHOLDER.to_string(),
        };
        self.frame_count = match stats.frame_count {
            Some(count) if count > 0 => count.to_string(),
            _ => FRAME_COUNT_PLACEHOLDER.to_string(),
        };
        self.frame_size = match stats.avg_frame_size {
            Some(size) if size > 0.0 => format!("{} KB", (size / 1024.0).round() as u64),
            _ => FRAME_SIZE_PLACEHOLDER.to_string(),
        };

        let age = unix_now - stats.last_update.unwrap_or(0.0);
        if age < freshness.as_secs_f64() {
            self.activity = StreamActivity::Streaming;
            Some(Duration::from_secs_f64(age.max(0.0)))
        } else {
            self.activity = StreamActivity::Disconnected;
            None
        }
    }

    /// A poll failed before any response arrived; metrics stay as they were
    pub fn mark_error(&mut self) {
        self.activity = StreamActivity::Error;
    }

    /// A response arrived but was unusable
    pub fn mark_malformed(&mut self) {
        self.reset_metrics();
        self.activity = StreamActivity::Idle;
    }

    pub fn reset_metrics(&mut self) {
        self.fps = FPS_PLACEHOLDER.to_string();
        self.frame_count = FRAME_COUNT_PLACEHOLDER.to_string();
        self.frame_size = FRAME_SIZE_PLACEHOLDER.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StreamStatsPayload;

    const NOW: f64 = 1_700_000_000.0;

    fn create_test_response(stats: Option<StreamStatsPayload>) -> StatsResponse {
        StatsResponse {
            current_camera: 1,
            resolution: "1280x720".to_string(),
            codec: Some("MJPEG".to_string()),
            quality: Some("80%".to_string()),
            active_clients: Some(1),
            max_clients: Some(2),
            stats,
        }
    }

    fn create_test_payload(last_update: f64) -> StreamStatsPayload {
        StreamStatsPayload {
            fps: Some(29.76),
            frame_count: Some(4521),
            avg_frame_size: Some(48_000.0),
            last_update: Some(last_update),
        }
    }

    #[test]
    fn test_fresh_stats_confirm_stream() {
        let mut view = StatsView::default();
        let response = create_test_response(Some(create_test_payload(NOW - 1.5)));

        let age = view.apply(&response, NOW, Duration::from_secs(3));

        assert_eq!(age, Some(Duration::from_secs_f64(1.5)));
        assert_eq!(view.activity, StreamActivity::Streaming);
        assert_eq!(view.fps, "29.76");
        assert_eq!(view.frame_count, "4521");
        assert_eq!(view.frame_size, "47 KB");
        assert_eq!(view.client_count.as_deref(), Some("1/2"));
        assert_eq!(view.server_camera, Some(1));
    }

    #[test]
    fn test_freshness_boundary_is_exclusive() {
        let mut view = StatsView::default();
        let response = create_test_response(Some(create_test_payload(NOW - 3.0)));

        assert_eq!(view.apply(&response, NOW, Duration::from_secs(3)), None);
        assert_eq!(view.activity, StreamActivity::Disconnected);
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let mut view = StatsView::default();
        let response = create_test_response(Some(create_test_payload(NOW + 2.0)));

        assert_eq!(
            view.apply(&response, NOW, Duration::from_secs(3)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_missing_stats_reset_to_placeholders() {
        let mut view = StatsView::default();
        view.apply(
            &create_test_response(Some(create_test_payload(NOW))),
            NOW,
            Duration::from_secs(3),
        );

        let age = view.apply(&create_test_response(None), NOW, Duration::from_secs(3));

        assert_eq!(age, None);
        assert_eq!(view.fps, "0.0");
        assert_eq!(view.frame_count, "0");
        assert_eq!(view.frame_size, "0 KB");
        assert_eq!(view.activity.text(), "idle");
    }

    #[test]
    fn test_empty_stats_object_is_missing() {
        let mut view = StatsView::default();
        let response = create_test_response(Some(StreamStatsPayload::default()));

        assert_eq!(view.apply(&response, NOW, Duration::from_secs(3)), None);
        assert_eq!(view.activity, StreamActivity::Idle);
    }

    #[test]
    fn test_zero_values_use_placeholders() {
        let mut view = StatsView::default();
        let payload = StreamStatsPayload {
            fps: Some(0.0),
            frame_count: Some(0),
            avg_frame_size: Some(0.0),
            last_update: Some(0.0),
        };

        view.apply(&create_test_response(Some(payload)), NOW, Duration::from_secs(3));

        assert_eq!(view.fps, "0.0");
        assert_eq!(view.frame_count, "0");
        assert_eq!(view.frame_size, "0 KB");
        assert_eq!(view.activity, StreamActivity::Disconnected);
    }

    #[test]
    fn test_transport_error_keeps_metrics() {
        let mut view = StatsView::default();
        view.apply(
            &create_test_response(Some(create_test_payload(NOW))),
            NOW,
            Duration::from_secs(3),
        );

        view.mark_error();
        assert_eq!(view.activity.text(), "error");
        assert_eq!(view.frame_count, "4521");

        view.mark_malformed();
        assert_eq!(view.frame_count, "0");
        assert_eq!(view.activity, StreamActivity::Idle);
    }
}
