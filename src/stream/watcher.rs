use crate::clock::Clock;
use crate::error::Result;
use crate::events::{EventSender, MonitorEvent};
use std::sync::Arc;

/// Relays stream-sink outcomes into the session queue, stamping frames with the
/// time they were received
#[derive(Clone)]
pub struct FrameWatcher {
    events: EventSender,
    clock: Arc<dyn Clock>,
}

impl FrameWatcher {
    pub fn new(events: EventSender, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    pub async fn on_frame_loaded(&self, bytes: usize) -> Result<()> {
        let at = self.clock.now();
        self.events
            .publish(MonitorEvent::FrameLoaded { at, bytes })
            .await
    }

    pub async fn on_frame_error<S: Into<String>>(&self, reason: S) -> Result<()> {
        self.events
            .publish(MonitorEvent::FrameError {
                reason: reason.into(),
            })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}
