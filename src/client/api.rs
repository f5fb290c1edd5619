use super::types::{ActionResponse, CameraId, Resolution, StatsResponse};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Raw body chunks of the MJPEG stream
pub type StreamBody = BoxStream<'static, Result<Bytes>>;

/// Operations the camera server exposes over HTTP
#[async_trait]
pub trait CameraServerApi: Send + Sync {
    /// `POST /switch/{camera}`
    async fn switch_camera(&self, camera: CameraId) -> Result<ActionResponse>;

    /// `POST /api/resolution/{resolution}`
    async fn change_resolution(&self, resolution: Resolution) -> Result<ActionResponse>;

    /// `GET /api/stats`
    async fn fetch_stats(&self) -> Result<StatsResponse>;

    /// `HEAD /stream`; true when the server reports an active camera
    async fn probe_stream(&self) -> Result<bool>;

    /// `POST /api/shutdown`
    async fn shutdown_server(&self) -> Result<ActionResponse>;

    /// Open the MJPEG stream at `url` (see [`super::stream_url`])
    async fn open_stream(&self, url: &str) -> Result<StreamBody>;
}
