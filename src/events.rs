use crate::client::{CameraId, Resolution, StatsResponse};
use crate::error::{CamwatchError, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Why a stats poll produced no usable payload
#[derive(Debug, Clone, PartialEq)]
pub enum StatsFailure {
    /// The request never produced a response body
    Transport(String),
    /// A response arrived but could not be read as stats
    Malformed(String),
}

impl StatsFailure {
    pub fn from_error(error: &CamwatchError) -> Self {
        if error.is_transport() {
            StatsFailure::Transport(error.to_string())
        } else {
            StatsFailure::Malformed(error.to_string())
        }
    }
}

/// Result of a control request as seen by the session
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Accepted,
    Declined { message: Option<String> },
    Failed { error: String },
}

impl ActionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ActionOutcome::Accepted)
    }
}

/// Everything that can happen to a monitoring session.
/// All variants are handled one at a time by the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// The stream sink delivered a complete frame; `at` is the monotonic receive time
    FrameLoaded { at: Duration, bytes: usize },
    /// The stream sink failed or ended
    FrameError { reason: String },
    /// Time to reconnect the stream sink after a failure
    StreamRetry,
    /// The server's stats show a frame `age` ago
    ServerConfirmedActive { age: Duration },
    HeartbeatTick,
    QualityReportTick,
    StatsPollTick,
    StatsReceived(std::result::Result<StatsResponse, StatsFailure>),
    SwitchRequested { camera: CameraId },
    SwitchCompleted { camera: CameraId, outcome: ActionOutcome },
    ResolutionRequested { resolution: Resolution },
    ResolutionCompleted {
        resolution: Resolution,
        outcome: ActionOutcome,
    },
    ShutdownRequested { reason: String },
}

impl MonitorEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            MonitorEvent::FrameLoaded { bytes, .. } => format!("Frame loaded ({} bytes)", bytes),
            MonitorEvent::FrameError { reason } => format!("Frame error: {}", reason),
            MonitorEvent::StreamRetry => "Stream reconnect".to_string(),
            MonitorEvent::ServerConfirmedActive { age } => {
                format!("Server confirmed frame {:.2}s ago", age.as_secs_f64())
            }
            MonitorEvent::HeartbeatTick => "Heartbeat tick".to_string(),
            MonitorEvent::QualityReportTick => "Quality report tick".to_string(),
            MonitorEvent::StatsPollTick => "Stats poll tick".to_string(),
            MonitorEvent::StatsReceived(Ok(stats)) => format!(
                "Stats received (camera {}, {})",
                stats.current_camera, stats.resolution
            ),
            MonitorEvent::StatsReceived(Err(failure)) => format!("Stats failed: {:?}", failure),
            MonitorEvent::SwitchRequested { camera } => {
                format!("Switch to camera {} requested", camera)
            }
            MonitorEvent::SwitchCompleted { camera, outcome } => {
                format!("Switch to camera {} completed: {:?}", camera, outcome)
            }
            MonitorEvent::ResolutionRequested { resolution } => {
                format!("Resolution {} requested", resolution)
            }
            MonitorEvent::ResolutionCompleted {
                resolution,
                outcome,
            } => format!("Resolution {} completed: {:?}", resolution, outcome),
            MonitorEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            MonitorEvent::FrameLoaded { .. } => "frame_loaded",
            MonitorEvent::FrameError { .. } => "frame_error",
            MonitorEvent::StreamRetry => "stream_retry",
            MonitorEvent::ServerConfirmedActive { .. } => "server_confirmed_active",
            MonitorEvent::HeartbeatTick => "heartbeat_tick",
            MonitorEvent::QualityReportTick => "quality_report_tick",
            MonitorEvent::StatsPollTick => "stats_poll_tick",
            MonitorEvent::StatsReceived(_) => "stats_received",
            MonitorEvent::SwitchRequested { .. } => "switch_requested",
            MonitorEvent::SwitchCompleted { .. } => "switch_completed",
            MonitorEvent::ResolutionRequested { .. } => "resolution_requested",
            MonitorEvent::ResolutionCompleted { .. } => "resolution_completed",
            MonitorEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }

    /// Frequent events that are only logged at trace level
    fn is_routine(&self) -> bool {
        matches!(
            self,
            MonitorEvent::FrameLoaded { .. }
                | MonitorEvent::HeartbeatTick
                | MonitorEvent::QualityReportTick
                | MonitorEvent::StatsPollTick
                | MonitorEvent::StatsReceived(Ok(_))
        )
    }
}

/// I/O the runtime performs on behalf of the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchStats,
    SwitchCamera(CameraId),
    ChangeResolution(Resolution),
    /// Point the stream sink at a new (cache-busted) URL
    OpenStream(String),
    /// Deliver `event` to the queue after `delay`
    Schedule { delay: Duration, event: MonitorEvent },
    Shutdown { reason: String },
}

/// Sending half of the session's event queue
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<MonitorEvent>,
}

/// Create a bounded event queue with the specified capacity
pub fn event_queue(capacity: usize) -> (EventSender, mpsc::Receiver<MonitorEvent>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (EventSender { sender }, receiver)
}

impl EventSender {
    /// Queue an event for the session controller
    pub async fn publish(&self, event: MonitorEvent) -> Result<()> {
        match &event {
            MonitorEvent::FrameError { reason } => warn!("Stream sink error: {}", reason),
            MonitorEvent::ShutdownRequested { reason } => info!("Shutdown requested: {}", reason),
            event if event.is_routine() => trace!("Event: {}", event.description()),
            event => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .await
            .map_err(|e| CamwatchError::system(format!("Event queue closed: {}", e)))
    }

    /// Queue an event without waiting; used from blocking threads
    pub fn try_publish(&self, event: MonitorEvent) -> Result<()> {
        self.sender
            .try_send(event)
            .map_err(|e| CamwatchError::system(format!("Failed to queue event: {}", e)))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
