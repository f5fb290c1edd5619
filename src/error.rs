use thiserror::Error;

#[derive(Error, Debug)]
pub enum CamwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Server rejected {action} (HTTP {status}): {detail}")]
    Rejected {
        action: String,
        status: u16,
        detail: String,
    },

    #[error("Invalid camera id {id}; expected one of 0, 1")]
    InvalidCamera { id: i64 },

    #[error("Invalid resolution '{value}'; expected 640x480 or 1280x720")]
    InvalidResolution { value: String },

    #[error("Stream error: {message}")]
    Stream { message: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl CamwatchError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn stream<S: Into<String>>(message: S) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    pub fn rejected<S: Into<String>>(action: S, status: u16, detail: S) -> Self {
        Self::Rejected {
            action: action.into(),
            status,
            detail: detail.into(),
        }
    }

    /// True when the failure happened before a usable response arrived
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            Self::Io(_) | Self::Stream { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CamwatchError>;
