use kornia_image::Image;

use crate::BoundingBox;

/// Capability exposed by an object detection model.
///
/// The classifier only needs two things from a model: the detections it
/// finds in an image and the name it gives to each class index.
pub trait ObjectDetector {
    /// Error raised while running the model.
    type Error: std::error::Error;

    /// Detect objects in an rgb8 image.
    ///
    /// Detections below the model's own confidence floor are not returned.
    fn detect(&self, image: &Image<u8, 3>) -> Result<Vec<BoundingBox>, Self::Error>;

    /// Name of a class index in the model's vocabulary.
    fn class_name(&self, class: u32) -> Option<&str>;
}
