//! Centroid tracking of items crossing a kitchen pass, with zone-based
//! delivery counting.
//!
//! Feed per-frame detections into [`CentroidTracker::update`]; it keeps object
//! identities across frames, decides when an object has left (or come back to)
//! the kitchen polygon and reports the resulting delivery events. Events can be
//! handed to a [`SinkWriter`] so slow persistence never stalls the frame loop.

pub mod config;
pub mod error;
pub mod integration;
pub mod tracker;

pub use config::SessionConfig;
pub use error::{PolygonDefect, Result, SinkError, TrackError};
pub use integration::{
    DeliveryPipeline, DetectionBuilder, DetectionSource, EventSink, IntoDetections,
    JsonLinesSink, MemorySink, SinkStats, SinkWriter, SinkWriterConfig,
};
pub use tracker::{
    Category, CategoryCounts, CentroidTracker, Delta, DeliveryEvent, Detection, FrameUpdate,
    ObjectId, ObjectSnapshot, Point, RawDetection, RoiCounts, TrackerConfig, TrackerEvent,
    ZoneState,
};
