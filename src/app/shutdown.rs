use super::MonitorOrchestrator;
use crate::error::{CamwatchError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const COMPONENT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl MonitorOrchestrator {
    /// Stop background work: keyboard first, then the stream sink
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut failure = None;

        if self.keyboard_enabled {
            if let Some(handler) = &self.keyboard_handler {
                if let Err(e) = handler.stop().await {
                    error!("Error stopping keyboard: {}", e);
                    failure = Some(e);
                }
            }
        }

        if let Some(task) = self.sink_task.take() {
            match timeout(COMPONENT_STOP_TIMEOUT, task).await {
                Ok(Ok(())) => info!("Stream sink stopped"),
                Ok(Err(e)) => {
                    error!("Stream sink task failed: {}", e);
                    failure = Some(CamwatchError::system(format!("Stream sink task failed: {}", e)));
                }
                Err(_) => {
                    error!("Stream sink stop timeout");
                    failure = Some(CamwatchError::system("Stream sink stop timeout"));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => {
                info!("Graceful shutdown completed");
                Ok(())
            }
        }
    }
}
