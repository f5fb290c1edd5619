use super::api::{CameraServerApi, StreamBody};
use super::types::{ActionResponse, CameraId, Resolution, StatsResponse};
use crate::config::ServerConfig;
use crate::error::{CamwatchError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

/// reqwest-backed client for the camera server
#[derive(Debug, Clone)]
pub struct HttpCameraClient {
    client: Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl HttpCameraClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            CamwatchError::system(format!("Invalid server URL '{}': {}", config.base_url, e))
        })?;

        // No client-wide timeout: the stream connection stays open indefinitely
        let client = Client::builder()
            .user_agent(concat!("camwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stream URL for this server with a cache-busting `t` parameter
    pub fn stream_url(&self, cache_bust: i64) -> String {
        stream_url(&self.base_url, cache_bust)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn send(&self, action: &str, request: RequestBuilder) -> Result<Response> {
        let response = self.with_timeout(request).send().await?;
        let status = response.status();
        trace!("{} -> HTTP {}", action, status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CamwatchError::rejected(
            action.to_string(),
            status.as_u16(),
            rejection_detail(&body),
        ))
    }

    async fn send_json<T: DeserializeOwned>(&self, action: &str, request: RequestBuilder) -> Result<T> {
        let response = self.send(action, request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// `GET /stream` URL; a changing `t` forces a fresh connection past any cache
pub fn stream_url(base_url: &str, cache_bust: i64) -> String {
    format!("{}/stream?t={}", base_url.trim_end_matches('/'), cache_bust)
}

/// Pull `detail` out of an error body, falling back to the raw text
fn rejection_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CameraServerApi for HttpCameraClient {
    async fn switch_camera(&self, camera: CameraId) -> Result<ActionResponse> {
        debug!("Requesting switch to camera {}", camera);
        let url = self.endpoint(&format!("/switch/{}", camera));
        self.send_json("camera switch", self.client.post(url)).await
    }

    async fn change_resolution(&self, resolution: Resolution) -> Result<ActionResponse> {
        debug!("Requesting resolution {}", resolution);
        let url = self.endpoint(&format!("/api/resolution/{}", resolution));
        self.send_json("resolution change", self.client.post(url)).await
    }

    async fn fetch_stats(&self) -> Result<StatsResponse> {
        let url = self.endpoint("/api/stats");
        self.send_json("stats", self.client.get(url)).await
    }

    async fn probe_stream(&self) -> Result<bool> {
        let url = self.endpoint("/stream");
        let response = self.with_timeout(self.client.head(url)).send().await?;
        debug!("Stream probe returned HTTP {}", response.status());
        Ok(response.status().is_success())
    }

    async fn shutdown_server(&self) -> Result<ActionResponse> {
        let url = self.endpoint("/api/shutdown");
        self.send_json("shutdown", self.client.post(url)).await
    }

    async fn open_stream(&self, url: &str) -> Result<StreamBody> {
        debug!("Opening stream {}", url);
        let response = self.send("stream", self.client.get(url)).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CamwatchError::from))
            .boxed();
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_server_config(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 0,
        }
    }

    #[test]
    fn test_stream_url_is_cache_busted() {
        let client = HttpCameraClient::new(&create_test_server_config("http://cam.local:8000/")).unwrap();

        assert_eq!(client.base_url(), "http://cam.local:8000");
        assert_eq!(client.stream_url(42), "http://cam.local:8000/stream?t=42");
        assert_ne!(client.stream_url(1), client.stream_url(2));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpCameraClient::new(&create_test_server_config("not a url"));
        assert!(matches!(result, Err(CamwatchError::System { .. })));
    }

    #[test]
    fn test_rejection_detail_extraction() {
        assert_eq!(rejection_detail(r#"{"detail":"Invalid camera ID"}"#), "Invalid camera ID");
        assert_eq!(rejection_detail("Internal Server Error\n"), "Internal Server Error");
    }
}
