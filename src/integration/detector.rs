//! Trait for object detection inference backends.

use crate::tracker::{Detection, RawDetection};

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the tracker. Labels
/// are passed through as strings; unknown labels are dropped later by
/// [`parse_detections`].
///
/// # Example
///
/// ```ignore
/// use pass_tracker::{DetectionSource, RawDetection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Output = Vec<RawDetection>;
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Self::Output, Self::Error> {
///         Ok(vec![RawDetection::new(640, 360, "Food")])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Model-specific output, converted to detections by the pipeline.
    type Output: IntoDetections;

    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(&mut self, input: &[u8], width: u32, height: u32)
    -> Result<Self::Output, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `RawDetection`.
///
/// Implement this for your model's output format so a detector can return it
/// directly.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<RawDetection>;
}

impl IntoDetections for Vec<RawDetection> {
    fn into_detections(self) -> Vec<RawDetection> {
        self
    }
}

/// Resolve labels, dropping (and logging) detections with an unknown category.
/// Input order is preserved.
pub fn parse_detections(raw: impl IntoDetections) -> Vec<Detection> {
    raw.into_detections()
        .into_iter()
        .filter_map(|det| match Detection::try_from(det) {
            Ok(det) => Some(det),
            Err(e) => {
                log::warn!("Dropping detection: {}", e);
                None
            }
        })
        .collect()
}
