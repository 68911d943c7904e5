#![deny(missing_docs)]

//! Plastic waste classification in Rust
//!
//! This crate runs a YOLOv8 detector trained on plastic waste over an image
//! and reduces its detections to a single, JSON serializable [`Outcome`].
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use plastic_classifier::{ClassifierConfig, PlasticClassifier};
//!
//! let classifier = PlasticClassifier::new(ClassifierConfig {
//!     model_path: "models/nullify_plastic_best.safetensors".into(),
//!     ..Default::default()
//! });
//!
//! let outcome = classifier.run_inference(Path::new("path/to/image.jpg"));
//! println!("{outcome}");
//! ```

/// Bounding box module with non-maximum suppression
mod bounding_box;

/// Selection, thresholding and labelling of detections
mod classifier;

/// Detector capability consumed by the classifier
mod detector;

/// Display names of the model classes
mod labels;

/// YOLOv8 model definition in candle
mod model;

/// Classification outcome and its JSON form
mod outcome;

/// YOLOv8 high level interface
mod yolov8;

pub use bounding_box::{BoundingBox, non_maximum_suppression};
pub use classifier::{
    ClassifierConfig, ClassifierError, DEFAULT_MODEL_PATH, PlasticClassifier, default_model_path,
};
pub use detector::ObjectDetector;
pub use labels::{DISPLAY_LABELS, display_label};
pub use outcome::{Outcome, Unrecognized, round_confidence};
pub use yolov8::{ModelManifest, YoloV8, YoloV8Config, YoloV8Error, YoloV8Size};
