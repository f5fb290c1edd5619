mod api;
mod http;
mod types;

pub use api::{CameraServerApi, StreamBody};
pub use http::{stream_url, HttpCameraClient};
pub use types::{ActionResponse, CameraId, Resolution, StatsResponse, StreamStatsPayload};
