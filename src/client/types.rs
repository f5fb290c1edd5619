use crate::error::{CamwatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the server's cameras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(u8);

impl CameraId {
    pub const ALL: [CameraId; 2] = [CameraId(0), CameraId(1)];

    pub fn new(id: i64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|camera| camera.0 as i64 == id)
            .ok_or(CamwatchError::InvalidCamera { id })
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CameraId {
    type Err = CamwatchError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().parse::<i64>().map_err(|_| CamwatchError::InvalidCamera { id: -1 })?;
        Self::new(id)
    }
}

/// Stream resolutions the server accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "640x480")]
    Vga,
    #[serde(rename = "1280x720")]
    Hd720,
}

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::Vga, Resolution::Hd720];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Vga => "640x480",
            Resolution::Hd720 => "1280x720",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::Vga => (640, 480),
            Resolution::Hd720 => (1280, 720),
        }
    }

    /// Display layout class for the video container
    pub fn layout_class(&self) -> &'static str {
        match self {
            Resolution::Vga => "resolution-640",
            Resolution::Hd720 => "resolution-720",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = CamwatchError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|resolution| resolution.as_str() == value)
            .ok_or_else(|| CamwatchError::InvalidResolution {
                value: value.to_string(),
            })
    }
}

/// Body of the switch, resolution and shutdown endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub current_camera: u8,
    pub resolution: String,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub active_clients: Option<u32>,
    #[serde(default)]
    pub max_clients: Option<u32>,
    #[serde(default)]
    pub stats: Option<StreamStatsPayload>,
}

impl StatsResponse {
    /// Stream statistics, treating an empty object the same as a missing one
    pub fn stream_stats(&self) -> Option<&StreamStatsPayload> {
        self.stats.as_ref().filter(|stats| !stats.is_empty())
    }
}

/// Per-camera stream statistics reported by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStatsPayload {
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub frame_count: Option<u64>,
    #[serde(default)]
    pub avg_frame_size: Option<f64>,
    /// Server epoch seconds of the last stats update
    #[serde(default)]
    pub last_update: Option<f64>,
}

impl StreamStatsPayload {
    pub fn is_empty(&self) -> bool {
        self.fps.is_none()
            && self.frame_count.is_none()
            && self.avg_frame_size.is_none()
            && self.last_update.is_none()
    }
}
