use crate::client::{CameraId, Resolution};
use crate::error::Result;
use crate::events::{EventSender, MonitorEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Keyboard controls for an interactive watch session
pub struct KeyboardInputHandler {
    events: EventSender,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Keyboard controls: 0/1 camera, l/h resolution, s stats, q quit");

        let events = self.events.clone();
        let cancellation_token = self.cancellation_token.clone();

        // Spawn a blocking task to handle keyboard input
        task::spawn_blocking(move || {
            // Enable raw mode to capture individual key presses
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };

                        let Some(monitor_event) = key_to_event(key_event) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        let quit = matches!(monitor_event, MonitorEvent::ShutdownRequested { .. });
                        if let Err(e) = events.try_publish(monitor_event) {
                            warn!("Failed to publish keyboard event: {}", e);
                        }
                        if quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            // Disable raw mode when exiting
            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Ensure raw mode is disabled even if the task didn't clean up properly
        let _ = disable_raw_mode();

        Ok(())
    }
}

/// Session event for a key press; `None` for releases and unbound keys.
/// Raw mode swallows SIGINT, so Ctrl+C is mapped here as well.
pub fn key_to_event(key: KeyEvent) -> Option<MonitorEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(MonitorEvent::ShutdownRequested {
                reason: "Ctrl+C in raw mode".to_string(),
            })
        }
        KeyCode::Char(digit @ ('0' | '1')) => {
            let camera = CameraId::new(i64::from(digit as u8 - b'0')).ok()?;
            Some(MonitorEvent::SwitchRequested { camera })
        }
        KeyCode::Char('l') => Some(MonitorEvent::ResolutionRequested {
            resolution: Resolution::Vga,
        }),
        KeyCode::Char('h') => Some(MonitorEvent::ResolutionRequested {
            resolution: Resolution::Hd720,
        }),
        KeyCode::Char('s') => Some(MonitorEvent::StatsPollTick),
        KeyCode::Char('q') | KeyCode::Esc => Some(MonitorEvent::ShutdownRequested {
            reason: "User requested via keyboard".to_string(),
        }),
        _ => None,
    }
}
