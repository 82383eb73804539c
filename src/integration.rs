//! Integration module for connecting detection backends and event sinks with
//! the centroid tracker.
//!
//! This module provides the detector trait, detection builders, the
//! background sink writer and a pipeline tying them together.

mod builder;
mod detector;
mod pipeline;
mod sink;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections, parse_detections};
pub use pipeline::DeliveryPipeline;
pub use sink::{
    DeliveryRecord, EventSink, JsonLinesSink, MemorySink, SinkStats, SinkWriter,
    SinkWriterConfig,
};
