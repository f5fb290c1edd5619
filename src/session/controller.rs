use super::state::{MonitorSnapshot, SessionSettings, SessionState};
use crate::client::stream_url;
use crate::clock::Clock;
use crate::events::{ActionOutcome, Command, MonitorEvent, StatsFailure};
use crate::health::{ClockSample, HeartbeatStatus};
use crate::quality_bar::format_quality_bar;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Single owner of session state.
///
/// Events are applied one at a time; any I/O they need is returned as
/// [`Command`]s for the runtime to carry out. Given the same clock readings the
/// same event sequence always produces the same state.
pub struct SessionController {
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
    state: SessionState,
}

impl SessionController {
    pub fn new(settings: SessionSettings, clock: Arc<dyn Clock>) -> Self {
        let state = SessionState::new(&settings, clock.now());
        Self {
            settings,
            clock,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Commands to issue when the session begins: connect the stream and read
    /// stats straight away
    pub fn start(&mut self) -> Vec<Command> {
        info!(
            "Monitoring session {} started against {}",
            self.state.session_id, self.settings.base_url
        );
        let url = self.refresh_stream_url();
        vec![Command::OpenStream(url), Command::FetchStats]
    }

    pub fn handle(&mut self, event: MonitorEvent) -> Vec<Command> {
        let now = self.clock.now();

        match event {
            MonitorEvent::FrameLoaded { at, bytes } => {
                self.state.estimator.record_frame(ClockSample::new(at), bytes);
                Vec::new()
            }
            MonitorEvent::FrameError { reason } => {
                self.state.estimator.record_frame_error();
                debug!(
                    "Frame error ({}), {:.1}s since last frame",
                    reason,
                    self.state.estimator.elapsed_at(now).as_secs_f64()
                );

                if self.state.reconnect_pending {
                    return Vec::new();
                }
                self.state.reconnect_pending = true;
                vec![Command::Schedule {
                    delay: self.settings.reconnect_delay,
                    event: MonitorEvent::StreamRetry,
                }]
            }
            MonitorEvent::StreamRetry => {
                self.state.reconnect_pending = false;
                let url = self.refresh_stream_url();
                info!("Reconnecting stream: {}", url);
                vec![Command::OpenStream(url)]
            }
            MonitorEvent::ServerConfirmedActive { age } => {
                let at = ClockSample::new(now.saturating_sub(age));
                self.state.estimator.record_server_confirmation(at);
                Vec::new()
            }
            MonitorEvent::HeartbeatTick => {
                let previous = self.state.estimator.last_status();
                let report = self.state.estimator.tick(now);
                if report.status != previous {
                    log_status_change(previous, report.status, report.elapsed.as_secs_f64());
                }
                Vec::new()
            }
            MonitorEvent::QualityReportTick => {
                let bar = format_quality_bar(self.state.estimator.quality());
                info!("Network quality: {}", bar);
                Vec::new()
            }
            MonitorEvent::StatsPollTick => vec![Command::FetchStats],
            MonitorEvent::StatsReceived(Ok(response)) => {
                let unix_now = self.clock.unix_time();
                let confirmed = self
                    .state
                    .stats
                    .apply(&response, unix_now, self.settings.freshness);

                match confirmed {
                    Some(age) => self.handle(MonitorEvent::ServerConfirmedActive { age }),
                    None => Vec::new(),
                }
            }
            MonitorEvent::StatsReceived(Err(StatsFailure::Transport(error))) => {
                warn!("Stats update error: {}", error);
                self.state.stats.mark_error();
                Vec::new()
            }
            MonitorEvent::StatsReceived(Err(StatsFailure::Malformed(error))) => {
                warn!("Unusable stats payload: {}", error);
                self.state.stats.mark_malformed();
                Vec::new()
            }
            MonitorEvent::SwitchRequested { camera } => vec![Command::SwitchCamera(camera)],
            MonitorEvent::SwitchCompleted { camera, outcome } => {
                if !accepted("camera switch", &outcome) {
                    return Vec::new();
                }
                self.state.camera = camera;
                let url = self.refresh_stream_url();
                info!("Switched to camera {}", camera);
                vec![Command::OpenStream(url)]
            }
            MonitorEvent::ResolutionRequested { resolution } => {
                vec![Command::ChangeResolution(resolution)]
            }
            MonitorEvent::ResolutionCompleted {
                resolution,
                outcome,
            } => {
                if !accepted("resolution change", &outcome) {
                    return Vec::new();
                }
                self.state.resolution = resolution;
                let url = self.refresh_stream_url();
                info!(
                    "Resolution changed to {} (layout {})",
                    resolution,
                    resolution.layout_class()
                );
                vec![
                    Command::OpenStream(url),
                    Command::Schedule {
                        delay: self.settings.stats_refresh_delay,
                        event: MonitorEvent::StatsPollTick,
                    },
                ]
            }
            MonitorEvent::ShutdownRequested { reason } => vec![Command::Shutdown { reason }],
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let now = self.clock.now();
        let estimator = &self.state.estimator;

        MonitorSnapshot {
            session_id: self.state.session_id,
            camera: self.state.camera,
            resolution: self.state.resolution,
            layout_class: self.state.resolution.layout_class(),
            stream_url: self.state.stream_url.clone(),
            status: estimator.last_status(),
            quality: estimator.quality(),
            quality_bar: format_quality_bar(estimator.quality()),
            seconds_since_frame: estimator.elapsed_at(now).as_secs_f64(),
            counters: estimator.counters().clone(),
            stats: self.state.stats.clone(),
        }
    }

    /// New stream URL whose cache-busting value is strictly greater than the last
    fn refresh_stream_url(&mut self) -> String {
        let cache_bust = self
            .clock
            .unix_millis()
            .max(self.state.last_cache_bust + 1);
        self.state.last_cache_bust = cache_bust;

        let url = stream_url(&self.settings.base_url, cache_bust);
        self.state.stream_url = Some(url.clone());
        url
    }
}

fn accepted(action: &str, outcome: &ActionOutcome) -> bool {
    match outcome {
        ActionOutcome::Accepted => true,
        ActionOutcome::Declined { message } => {
            warn!(
                "Server declined {}: {}",
                action,
                message.as_deref().unwrap_or("no reason given")
            );
            false
        }
        ActionOutcome::Failed { error } => {
            warn!("{} failed: {}", action, error);
            false
        }
    }
}

fn log_status_change(previous: HeartbeatStatus, current: HeartbeatStatus, elapsed: f64) {
    match current {
        HeartbeatStatus::Live => info!("Heartbeat {} -> {}", previous, current),
        HeartbeatStatus::Delay => info!(
            "Heartbeat {} -> {} ({:.1}s since last frame)",
            previous, current, elapsed
        ),
        HeartbeatStatus::Error | HeartbeatStatus::Offline => warn!(
            "Heartbeat {} -> {} ({:.1}s since last frame)",
            previous, current, elapsed
        ),
    }
}
