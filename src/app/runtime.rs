use super::{MonitorOrchestrator, ShutdownReason};
use crate::error::{CamwatchError, Result};
use crate::events::{EventSender, MonitorEvent};
use crate::stream::{FrameWatcher, StreamSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

impl MonitorOrchestrator {
    /// Run the session until a shutdown is requested or the token is cancelled
    pub async fn run(&mut self) -> Result<ShutdownReason> {
        let mut receiver = self.receiver.take().ok_or_else(|| CamwatchError::System {
            message: "Event receiver already taken".to_string(),
        })?;

        info!("Camwatch monitor is running against {}", self.config.server.base_url);

        self.start_components().await?;
        self.setup_signal_handlers();

        let commands = self.controller.start();
        self.publish_snapshot();
        let mut pending = self.execute(commands);

        let mut heartbeat = periodic(self.config.heartbeat.interval());
        let mut quality_report = periodic(self.config.quality.report_interval());
        let mut stats_poll = periodic(self.config.stats.poll_interval());

        let reason = loop {
            if let Some(reason) = pending.take() {
                break reason;
            }

            let event = tokio::select! {
                _ = self.cancellation_token.cancelled() => break ShutdownReason::Cancelled,
                _ = heartbeat.tick() => MonitorEvent::HeartbeatTick,
                _ = quality_report.tick() => MonitorEvent::QualityReportTick,
                _ = stats_poll.tick() => MonitorEvent::StatsPollTick,
                received = receiver.recv() => match received {
                    Some(event) => event,
                    None => {
                        error!("Event queue closed unexpectedly");
                        break ShutdownReason::Cancelled;
                    }
                },
            };

            let commands = self.controller.handle(event);
            self.publish_snapshot();
            pending = self.execute(commands);
        };

        info!("Shutdown initiated: {}", reason);
        self.shutdown_reason = Some(reason.clone());

        drop(receiver);
        self.shutdown().await?;

        info!("Camwatch monitor stopped");
        Ok(reason)
    }

    async fn start_components(&mut self) -> Result<()> {
        let watcher = FrameWatcher::new(self.events.clone(), Arc::clone(&self.clock));
        let sink = StreamSink::new(
            Arc::clone(&self.api),
            watcher,
            self.stream_urls.subscribe(),
            self.config.stream.max_buffer_bytes,
            self.cancellation_token.child_token(),
        );
        self.sink_task = Some(tokio::spawn(sink.run()));

        if self.keyboard_enabled {
            if let Some(handler) = &self.keyboard_handler {
                handler.start().await?;
            }
        }

        Ok(())
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }

    /// Turn SIGINT and SIGTERM into shutdown events
    fn setup_signal_handlers(&self) {
        let token = self.cancellation_token.clone();

        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let events = self.events.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = token.cancelled() => {}
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        request_shutdown(&events, "SIGTERM").await;
                    }
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                Ok(()) = signal::ctrl_c() => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    request_shutdown(&events, "SIGINT").await;
                }
            }
        });
    }
}

async fn request_shutdown(events: &EventSender, reason: &str) {
    let event = MonitorEvent::ShutdownRequested {
        reason: reason.to_string(),
    };
    if let Err(e) = events.publish(event).await {
        debug!("Shutdown event not delivered: {}", e);
    }
}

/// Interval whose first tick is one period from now; late ticks are delayed
/// rather than bunched
fn periodic(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
