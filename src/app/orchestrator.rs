use super::ShutdownReason;
use crate::client::CameraServerApi;
use crate::clock::Clock;
use crate::config::CamwatchConfig;
use crate::events::{event_queue, EventSender, MonitorEvent};
use crate::keyboard_input::KeyboardInputHandler;
use crate::session::{MonitorSnapshot, SessionController, SessionSettings};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wires the session controller to the camera server, the stream sink and the
/// periodic timers, and executes the commands the controller returns
pub struct MonitorOrchestrator {
    pub(super) config: CamwatchConfig,
    pub(super) api: Arc<dyn CameraServerApi>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) controller: SessionController,

    // Event plumbing
    pub(super) events: EventSender,
    pub(super) receiver: Option<mpsc::Receiver<MonitorEvent>>,
    pub(super) stream_urls: watch::Sender<Option<String>>,
    pub(super) snapshots: watch::Sender<MonitorSnapshot>,

    // Components
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,
    pub(super) sink_task: Option<JoinHandle<()>>,

    // Lifecycle management
    pub(super) shutdown_reason: Option<ShutdownReason>,
    pub(super) cancellation_token: CancellationToken,
}

impl MonitorOrchestrator {
    pub fn new(config: CamwatchConfig, api: Arc<dyn CameraServerApi>, clock: Arc<dyn Clock>) -> Self {
        let (events, receiver) = event_queue(config.system.event_queue_capacity);
        let controller =
            SessionController::new(SessionSettings::from_config(&config), Arc::clone(&clock));
        let (stream_urls, _) = watch::channel(None);
        let (snapshots, _) = watch::channel(controller.snapshot());
        let keyboard_handler = Some(KeyboardInputHandler::new(events.clone()));
        let keyboard_enabled = config.system.keyboard;

        Self {
            config,
            api,
            clock,
            controller,
            events,
            receiver: Some(receiver),
            stream_urls,
            snapshots,
            keyboard_handler,
            keyboard_enabled,
            sink_task: None,
            shutdown_reason: None,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Enable or disable keyboard controls
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    /// Handle for feeding events into the session from outside the runtime
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Receive a fresh snapshot after every handled event
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn shutdown_reason(&self) -> Option<&ShutdownReason> {
        self.shutdown_reason.as_ref()
    }

    pub fn config(&self) -> &CamwatchConfig {
        &self.config
    }
}
