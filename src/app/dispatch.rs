use super::{MonitorOrchestrator, ShutdownReason};
use crate::client::ActionResponse;
use crate::error::Result;
use crate::events::{ActionOutcome, Command, MonitorEvent, StatsFailure};
use std::future::Future;
use tracing::{debug, trace};

impl MonitorOrchestrator {
    /// Carry out the controller's commands; returns the shutdown reason if one
    /// of them ends the session
    pub(super) fn execute(&self, commands: Vec<Command>) -> Option<ShutdownReason> {
        let mut shutdown = None;

        for command in commands {
            trace!("Executing {:?}", command);

            match command {
                Command::FetchStats => {
                    let api = self.api.clone();
                    self.spawn_event(async move {
                        let result = api
                            .fetch_stats()
                            .await
                            .map_err(|e| StatsFailure::from_error(&e));
                        MonitorEvent::StatsReceived(result)
                    });
                }
                Command::SwitchCamera(camera) => {
                    let api = self.api.clone();
                    self.spawn_event(async move {
                        let outcome = action_outcome(api.switch_camera(camera).await);
                        MonitorEvent::SwitchCompleted { camera, outcome }
                    });
                }
                Command::ChangeResolution(resolution) => {
                    let api = self.api.clone();
                    self.spawn_event(async move {
                        let outcome = action_outcome(api.change_resolution(resolution).await);
                        MonitorEvent::ResolutionCompleted {
                            resolution,
                            outcome,
                        }
                    });
                }
                Command::OpenStream(url) => {
                    self.stream_urls.send_replace(Some(url));
                }
                Command::Schedule { delay, event } => {
                    self.spawn_event(async move {
                        tokio::time::sleep(delay).await;
                        event
                    });
                }
                Command::Shutdown { reason } => {
                    shutdown = Some(ShutdownReason::Requested(reason));
                }
            }
        }

        shutdown
    }

    /// Run `task` in the background and queue the event it yields, unless the
    /// session is cancelled first
    fn spawn_event<F>(&self, task: F)
    where
        F: Future<Output = MonitorEvent> + Send + 'static,
    {
        let events = self.events.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            let event = tokio::select! {
                _ = token.cancelled() => return,
                event = task => event,
            };

            if let Err(e) = events.publish(event).await {
                debug!("Dropping event after shutdown: {}", e);
            }
        });
    }
}

/// Map a control request's result onto what the session should do with it
pub(super) fn action_outcome(result: Result<ActionResponse>) -> ActionOutcome {
    match result {
        Ok(response) if response.success => ActionOutcome::Accepted,
        Ok(response) => ActionOutcome::Declined {
            message: response.message,
        },
        Err(e) => ActionOutcome::Failed {
            error: e.to_string(),
        },
    }
}
