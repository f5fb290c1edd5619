use super::mjpeg::mjpeg_frames;
use super::watcher::FrameWatcher;
use crate::client::CameraServerApi;
use crate::error::Result;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consumes the MJPEG stream and feeds the frame watcher.
///
/// The sink follows the URL published on `urls`: a new URL drops the current
/// connection and opens the new one. After a failure it stays idle until the
/// session publishes a fresh URL.
pub struct StreamSink {
    api: Arc<dyn CameraServerApi>,
    watcher: FrameWatcher,
    urls: watch::Receiver<Option<String>>,
    max_buffer: usize,
    cancellation_token: CancellationToken,
}

impl StreamSink {
    pub fn new(
        api: Arc<dyn CameraServerApi>,
        watcher: FrameWatcher,
        urls: watch::Receiver<Option<String>>,
        max_buffer: usize,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            api,
            watcher,
            urls,
            max_buffer,
            cancellation_token,
        }
    }

    pub async fn run(mut self) {
        info!("Stream sink started");

        loop {
            let current = self.urls.borrow_and_update().clone();

            let Some(url) = current else {
                if !self.wait_for_url().await {
                    break;
                }
                continue;
            };

            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                changed = self.urls.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!("Stream URL changed, reconnecting");
                }
                result = consume(self.api.as_ref(), &self.watcher, &url, self.max_buffer) => {
                    let reason = match result {
                        Ok(()) => "stream ended".to_string(),
                        Err(e) => e.to_string(),
                    };

                    if self.watcher.on_frame_error(reason).await.is_err() {
                        break;
                    }

                    if !self.wait_for_url().await {
                        break;
                    }
                }
            }
        }

        info!("Stream sink stopped");
    }

    /// Wait until a new URL is published; false when the sink should stop
    async fn wait_for_url(&mut self) -> bool {
        tokio::select! {
            _ = self.cancellation_token.cancelled() => false,
            changed = self.urls.changed() => changed.is_ok(),
        }
    }
}

async fn consume(
    api: &dyn CameraServerApi,
    watcher: &FrameWatcher,
    url: &str,
    max_buffer: usize,
) -> Result<()> {
    let body = api.open_stream(url).await?;
    info!("Stream connected: {}", url);

    let frames = mjpeg_frames(body, max_buffer);
    tokio::pin!(frames);

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        if let Err(e) = watcher.on_frame_loaded(frame.len()).await {
            warn!("Dropping stream connection: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
