use crate::client::{ActionResponse, CameraId, CameraServerApi, Resolution, StatsResponse, StreamBody};
use crate::error::{CamwatchError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// What the next `open_stream` call produces
#[derive(Debug, Clone)]
pub enum MockStream {
    /// Deliver these body chunks, then end the stream
    Chunks(Vec<Vec<u8>>),
    /// Deliver these chunks, then keep the connection open
    ChunksThenHang(Vec<Vec<u8>>),
    /// Refuse the connection
    Refuse(String),
}

/// In-memory camera server for tests
pub struct MockCameraServer {
    stats: Mutex<std::result::Result<StatsResponse, String>>,
    accept_actions: Mutex<bool>,
    streams: Mutex<VecDeque<MockStream>>,
    calls: Mutex<Vec<String>>,
    opened_urls: Mutex<Vec<String>>,
}

impl MockCameraServer {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(Ok(idle_stats())),
            accept_actions: Mutex::new(true),
            streams: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            opened_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_stats(&self, stats: StatsResponse) {
        *self.stats.lock() = Ok(stats);
    }

    pub fn fail_stats(&self, reason: &str) {
        *self.stats.lock() = Err(reason.to_string());
    }

    pub fn set_accept_actions(&self, accept: bool) {
        *self.accept_actions.lock() = accept;
    }

    pub fn push_stream(&self, stream: MockStream) {
        self.streams.lock().push_back(stream);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.starts_with(name)).count()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().clone()
    }

    fn action(&self, call: String) -> ActionResponse {
        self.calls.lock().push(call);
        ActionResponse {
            success: *self.accept_actions.lock(),
            message: None,
        }
    }
}

impl Default for MockCameraServer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn idle_stats() -> StatsResponse {
    StatsResponse {
        current_camera: 0,
        resolution: "640x480".to_string(),
        codec: Some("MJPEG".to_string()),
        quality: Some("80%".to_string()),
        active_clients: None,
        max_clients: None,
        stats: None,
    }
}

/// One multipart part wrapping a minimal JPEG
pub fn mjpeg_part(payload: &[u8]) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend_from_slice(payload);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);

    let mut part = format!(
        "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    )
    .into_bytes();
    part.extend_from_slice(&jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

#[async_trait]
impl CameraServerApi for MockCameraServer {
    async fn switch_camera(&self, camera: CameraId) -> Result<ActionResponse> {
        Ok(self.action(format!("switch:{}", camera)))
    }

    async fn change_resolution(&self, resolution: Resolution) -> Result<ActionResponse> {
        Ok(self.action(format!("resolution:{}", resolution)))
    }

    async fn fetch_stats(&self) -> Result<StatsResponse> {
        self.calls.lock().push("stats".to_string());
        self.stats.lock().clone().map_err(CamwatchError::stream)
    }

    async fn probe_stream(&self) -> Result<bool> {
        self.calls.lock().push("probe".to_string());
        Ok(!self.streams.lock().is_empty())
    }

    async fn shutdown_server(&self) -> Result<ActionResponse> {
        Ok(self.action("shutdown".to_string()))
    }

    async fn open_stream(&self, url: &str) -> Result<StreamBody> {
        self.opened_urls.lock().push(url.to_string());
        let next = self.streams.lock().pop_front();

        let body = match next {
            Some(MockStream::Chunks(chunks)) => stream::iter(
                chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))),
            )
            .boxed(),
            Some(MockStream::ChunksThenHang(chunks)) => stream::iter(
                chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))),
            )
            .chain(stream::pending())
            .boxed(),
            Some(MockStream::Refuse(reason)) => {
                return Err(CamwatchError::rejected("stream".to_string(), 503, reason))
            }
            None => stream::pending().boxed(),
        };

        Ok(body)
    }
}
