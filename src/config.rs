//! Session configuration loaded from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::integration::SinkWriterConfig;
use crate::tracker::TrackerConfig;

/// Everything fixed for the lifetime of a tracking session.
///
/// Missing fields fall back to their defaults, so `{}` is a valid file.
///
/// ```json
/// {
///   "tracker": {
///     "kitchen_roi": [[0, 0], [640, 0], [640, 360], [0, 360]],
///     "max_disappeared": 10,
///     "max_distance": 100.0,
///     "trail_length": 30,
///     "exit_margin_px": 5.0
///   },
///   "sink": { "queue_capacity": 256, "call_timeout_ms": 2000 },
///   "frame_stride": 2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tracker: TrackerConfig,
    pub sink: SinkWriterConfig,
    /// Run detection on every n-th frame
    pub frame_stride: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            sink: SinkWriterConfig::default(),
            frame_stride: 2,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Reject configurations that would fail once frames start flowing.
    pub fn validate(&self) -> Result<()> {
        self.tracker.build_zone()?;
        if self.frame_stride == 0 {
            return Err(TrackError::config("frame_stride must be at least 1"));
        }
        if self.sink.queue_capacity == 0 {
            return Err(TrackError::config("sink.queue_capacity must be at least 1"));
        }
        if self.sink.initial_backoff_ms > self.sink.max_backoff_ms {
            return Err(TrackError::config(
                "sink.initial_backoff_ms must not exceed sink.max_backoff_ms",
            ));
        }
        Ok(())
    }
}
