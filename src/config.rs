use crate::health::{HeartbeatThresholds, QualityPolicy};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CamwatchConfig {
    pub server: ServerConfig,
    pub heartbeat: HeartbeatConfig,
    pub quality: QualityConfig,
    pub stats: StatsConfig,
    pub stream: StreamConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Base URL of the camera server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout for control and stats calls (0 = none)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HeartbeatConfig {
    /// Heartbeat tick period in milliseconds
    #[serde(default = "default_heartbeat_interval_ms")]
    pub interval_ms: u64,

    /// Gap (seconds) at which LIVE becomes DELAY
    #[serde(default = "default_delay_after_secs")]
    pub delay_after_secs: f64,

    /// Gap (seconds) at which DELAY becomes ERROR
    #[serde(default = "default_error_after_secs")]
    pub error_after_secs: f64,

    /// Gap (seconds) at which ERROR becomes OFFLINE
    #[serde(default = "default_offline_after_secs")]
    pub offline_after_secs: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QualityConfig {
    /// Quality bar report period in milliseconds
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// Score added for every received frame
    #[serde(default = "default_recover_step")]
    pub recover_step: u8,

    /// Gap (seconds) above which the short-gap decay applies
    #[serde(default = "default_short_gap_secs")]
    pub short_gap_secs: f64,

    #[serde(default = "default_short_gap_step")]
    pub short_gap_step: u8,

    /// Lowest score the short-gap decay can produce
    #[serde(default = "default_short_gap_floor")]
    pub short_gap_floor: u8,

    /// Gap (seconds) above which the long-gap decay applies
    #[serde(default = "default_long_gap_secs")]
    pub long_gap_secs: f64,

    #[serde(default = "default_long_gap_step")]
    pub long_gap_step: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatsConfig {
    /// Stats poll period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before re-reading stats after a resolution change
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Maximum age (seconds) of the server's last_update still counted as active
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StreamConfig {
    /// Delay before reconnecting after the stream fails
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound on buffered, not yet parsed stream bytes
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event queue capacity
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Enable keyboard controls while watching
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn thresholds(&self) -> HeartbeatThresholds {
        HeartbeatThresholds::new(
            seconds(self.delay_after_secs),
            seconds(self.error_after_secs),
            seconds(self.offline_after_secs),
        )
    }
}

impl QualityConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn policy(&self) -> QualityPolicy {
        QualityPolicy {
            recover_step: self.recover_step,
            short_gap: seconds(self.short_gap_secs),
            short_gap_step: self.short_gap_step,
            short_gap_floor: self.short_gap_floor,
            long_gap: seconds(self.long_gap_secs),
            long_gap_step: self.long_gap_step,
        }
    }
}

impl StatsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn freshness(&self) -> Duration {
        seconds(self.freshness_secs)
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl CamwatchConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("camwatch.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("server.base_url", default_base_url())?
            .set_default("server.request_timeout_ms", default_request_timeout_ms())?
            .set_default("heartbeat.interval_ms", default_heartbeat_interval_ms())?
            .set_default("heartbeat.delay_after_secs", default_delay_after_secs())?
            .set_default("heartbeat.error_after_secs", default_error_after_secs())?
            .set_default("heartbeat.offline_after_secs", default_offline_after_secs())?
            .set_default("quality.report_interval_ms", default_report_interval_ms())?
            .set_default("quality.recover_step", default_recover_step() as u64)?
            .set_default("quality.short_gap_secs", default_short_gap_secs())?
            .set_default("quality.short_gap_step", default_short_gap_step() as u64)?
            .set_default("quality.short_gap_floor", default_short_gap_floor() as u64)?
            .set_default("quality.long_gap_secs", default_long_gap_secs())?
            .set_default("quality.long_gap_step", default_long_gap_step() as u64)?
            .set_default("stats.poll_interval_ms", default_poll_interval_ms())?
            .set_default("stats.refresh_delay_ms", default_refresh_delay_ms())?
            .set_default("stats.freshness_secs", default_freshness_secs())?
            .set_default("stream.reconnect_delay_ms", default_reconnect_delay_ms())?
            .set_default("stream.max_buffer_bytes", default_max_buffer_bytes() as u64)?
            .set_default(
                "system.event_queue_capacity",
                default_event_queue_capacity() as u64,
            )?
            .set_default("system.keyboard", default_keyboard())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // CAMWATCH__SERVER__BASE_URL style overrides
            .add_source(
                Environment::with_prefix("CAMWATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: CamwatchConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if reqwest::Url::parse(&self.server.base_url).is_err() {
            return Err(ConfigError::Message(format!(
                "Server base_url '{}' is not a valid URL",
                self.server.base_url
            )));
        }

        for (name, value) in [
            ("heartbeat.interval_ms", self.heartbeat.interval_ms),
            ("quality.report_interval_ms", self.quality.report_interval_ms),
            ("stats.poll_interval_ms", self.stats.poll_interval_ms),
            ("stream.reconnect_delay_ms", self.stream.reconnect_delay_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Message(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        for (name, value) in [
            ("heartbeat.delay_after_secs", self.heartbeat.delay_after_secs),
            ("heartbeat.error_after_secs", self.heartbeat.error_after_secs),
            ("heartbeat.offline_after_secs", self.heartbeat.offline_after_secs),
            ("quality.short_gap_secs", self.quality.short_gap_secs),
            ("quality.long_gap_secs", self.quality.long_gap_secs),
            ("stats.freshness_secs", self.stats.freshness_secs),
        ] {
            if let Err(e) = Duration::try_from_secs_f64(value) {
                return Err(ConfigError::Message(format!(
                    "{} must be a non-negative number of seconds ({})",
                    name, e
                )));
            }
        }

        if !self.heartbeat.thresholds().is_ordered() {
            return Err(ConfigError::Message(
                "Heartbeat thresholds must be positive and strictly increasing".to_string(),
            ));
        }

        if self.quality.short_gap_secs >= self.quality.long_gap_secs {
            return Err(ConfigError::Message(
                "quality.short_gap_secs must be less than quality.long_gap_secs".to_string(),
            ));
        }

        for (name, value) in [
            ("quality.recover_step", self.quality.recover_step),
            ("quality.short_gap_step", self.quality.short_gap_step),
            ("quality.short_gap_floor", self.quality.short_gap_floor),
            ("quality.long_gap_step", self.quality.long_gap_step),
        ] {
            if value > 100 {
                return Err(ConfigError::Message(format!(
                    "{} must be within 0..=100",
                    name
                )));
            }
        }

        if self.stream.max_buffer_bytes < 1024 {
            return Err(ConfigError::Message(
                "stream.max_buffer_bytes must be at least 1024".to_string(),
            ));
        }

        if self.system.event_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Event queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for CamwatchConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: default_base_url(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            heartbeat: HeartbeatConfig {
                interval_ms: default_heartbeat_interval_ms(),
                delay_after_secs: default_delay_after_secs(),
                error_after_secs: default_error_after_secs(),
                offline_after_secs: default_offline_after_secs(),
            },
            quality: QualityConfig {
                report_interval_ms: default_report_interval_ms(),
                recover_step: default_recover_step(),
                short_gap_secs: default_short_gap_secs(),
                short_gap_step: default_short_gap_step(),
                short_gap_floor: default_short_gap_floor(),
                long_gap_secs: default_long_gap_secs(),
                long_gap_step: default_long_gap_step(),
            },
            stats: StatsConfig {
                poll_interval_ms: default_poll_interval_ms(),
                refresh_delay_ms: default_refresh_delay_ms(),
                freshness_secs: default_freshness_secs(),
            },
            stream: StreamConfig {
                reconnect_delay_ms: default_reconnect_delay_ms(),
                max_buffer_bytes: default_max_buffer_bytes(),
            },
            system: SystemConfig {
                event_queue_capacity: default_event_queue_capacity(),
                keyboard: default_keyboard(),
            },
        }
    }
}

// Default value functions
/// Seconds from a config value; out-of-range values saturate, `validate()` rejects them
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_request_timeout_ms() -> u64 {
    0
}

fn default_heartbeat_interval_ms() -> u64 {
    500
}
fn default_delay_after_secs() -> f64 {
    1.0
}
fn default_error_after_secs() -> f64 {
    3.0
}
fn default_offline_after_secs() -> f64 {
    5.0
}

fn default_report_interval_ms() -> u64 {
    2000
}
fn default_recover_step() -> u8 {
    5
}
fn default_short_gap_secs() -> f64 {
    1.0
}
fn default_short_gap_step() -> u8 {
    5
}
fn default_short_gap_floor() -> u8 {
    30
}
fn default_long_gap_secs() -> f64 {
    3.0
}
fn default_long_gap_step() -> u8 {
    20
}

fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_refresh_delay_ms() -> u64 {
    500
}
fn default_freshness_secs() -> f64 {
    3.0
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}
fn default_max_buffer_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_event_queue_capacity() -> usize {
    256
}
fn default_keyboard() -> bool {
    false
}
