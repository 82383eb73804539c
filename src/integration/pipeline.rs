//! DeliveryPipeline for combining detection, tracking and event persistence.

use chrono::{DateTime, Utc};

use crate::tracker::{CentroidTracker, FrameUpdate, TrackerEvent};

use super::{DetectionSource, SinkWriter, parse_detections};

/// Bundles a detector, the centroid tracker and an optional sink writer.
///
/// Only every `frame_stride`-th frame is run through the detector; skipped
/// frames leave the tracker untouched.
pub struct DeliveryPipeline<D: DetectionSource> {
    detector: D,
    tracker: CentroidTracker,
    writer: Option<SinkWriter>,
    frame_stride: u32,
    frames_seen: u64,
    source: Option<String>,
}

impl<D: DetectionSource> DeliveryPipeline<D> {
    /// Create a new pipeline processing every frame.
    pub fn new(detector: D, tracker: CentroidTracker) -> Self {
        Self {
            detector,
            tracker,
            writer: None,
            frame_stride: 1,
            frames_seen: 0,
            source: None,
        }
    }

    /// Forward delivery events to `writer`.
    pub fn with_writer(mut self, writer: SinkWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Process every `stride`-th frame. Zero is treated as one.
    pub fn with_frame_stride(mut self, stride: u32) -> Self {
        self.frame_stride = stride.max(1);
        self
    }

    /// Label attached to subsequent events, typically the current clip path.
    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Process a single frame at the current wall-clock time.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<FrameUpdate>, D::Error> {
        self.process_frame_at(input, width, height, Utc::now())
    }

    /// Process a single frame observed at `timestamp`.
    ///
    /// Returns `Ok(None)` for frames skipped by the stride.
    pub fn process_frame_at(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<FrameUpdate>, D::Error> {
        self.frames_seen += 1;
        if self.frames_seen % self.frame_stride as u64 != 0 {
            return Ok(None);
        }

        let raw = self.detector.detect(input, width, height)?;
        let detections = parse_detections(raw);
        let mut update = self.tracker.update(&detections, timestamp);

        for event in update.events.iter_mut() {
            if let TrackerEvent::Delivery(delivery) = event {
                delivery.source = self.source.clone();
                if let Some(writer) = &self.writer {
                    writer.submit(delivery.clone());
                }
            }
        }
        Ok(Some(update))
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    pub fn writer(&self) -> Option<&SinkWriter> {
        self.writer.as_ref()
    }

    /// Stop the sink writer, draining queued events, and return the tracker.
    pub fn finish(self) -> CentroidTracker {
        if let Some(writer) = self.writer {
            let stats = writer.shutdown();
            log::info!(
                "Pipeline finished: {} events written, {} dropped, {} failed, {} slow calls",
                stats.written,
                stats.dropped,
                stats.failed,
                stats.overruns
            );
        }
        self.tracker
    }
}
