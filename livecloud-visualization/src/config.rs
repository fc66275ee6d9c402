//! Viewer configuration

use crate::scene::SphereStyle;
use livecloud_core::{Error, Result};
use livecloud_io::DecodeOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration of a streaming viewer, loadable from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Topic carrying point frames
    pub topic: String,
    /// Broker address for network transports
    pub broker_url: String,
    /// Reject point sets containing NaN or infinite coordinates
    pub validate_coordinates: bool,
    /// Target frame time; 0 renders as fast as possible
    pub frame_interval_ms: u64,
    pub sphere: SphereStyle,
    pub decode: DecodeOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            topic: "points".to_string(),
            broker_url: "ws://localhost:8080".to_string(),
            validate_coordinates: true,
            frame_interval_ms: 16,
            sphere: SphereStyle::default(),
            decode: DecodeOptions::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.is_empty() {
            return Err(Error::Config("topic must not be empty".to_string()));
        }
        if !self.sphere.radius.is_finite() || self.sphere.radius <= 0.0 {
            return Err(Error::Config(format!(
                "sphere radius must be positive and finite, got {}",
                self.sphere.radius
            )));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        (self.frame_interval_ms > 0).then(|| Duration::from_millis(self.frame_interval_ms))
    }
}
