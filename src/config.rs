use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INDI_PORT: u16 = 7624;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid camera device pattern [{pattern}]: {source}")]
    InvalidDevicePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Identifies the distinguished camera device and its exposure property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device_pattern: String,
    pub exposure_property: String,
    pub exposure_element: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_pattern: "(?i)ccd|camera".to_owned(),
            exposure_property: "CCD_EXPOSURE".to_owned(),
            exposure_element: "CCD_EXPOSURE_VALUE".to_owned(),
        }
    }
}

impl CameraConfig {
    pub fn device_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.device_pattern = pattern.into();
        self
    }

    pub fn exposure_property(mut self, name: impl Into<String>) -> Self {
        self.exposure_property = name.into();
        self
    }

    pub fn exposure_element(mut self, name: impl Into<String>) -> Self {
        self.exposure_element = name.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub hostname: String,
    pub port: u16,
    pub poll_interval_ms: u64,
    pub channel_size: usize,
    pub event_timeout: u64,
    pub camera: CameraConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

impl SessionConfig {
    /// Create a new instance with required fields and default optional fields
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_INDI_PORT,
            poll_interval_ms: 2000,
            channel_size: 64,
            event_timeout: 30,
            camera: CameraConfig::default(),
        }
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        let ms = interval.as_millis().max(1);
        self.poll_interval_ms = u64::try_from(ms).unwrap_or(u64::MAX);
        self
    }

    pub fn channel_size(mut self, channel_size: usize) -> Self {
        if channel_size == 0 {
            log::warn!("Channel size 0 is not allowed, using 1");
        }
        self.channel_size = channel_size.max(1);
        self
    }

    /// Idle timeout of the session loop in seconds, at least 1.
    pub fn event_timeout(mut self, seconds: u64) -> Self {
        if seconds == 0 {
            log::warn!("Event timeout 0 is not allowed, using 1s");
        }
        self.event_timeout = seconds.max(1);
        self
    }

    pub fn camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn address(&self) -> (String, u16) {
        (self.hostname.clone(), self.port)
    }
}
