use std::path::{Path, PathBuf};

use kornia_image::Image;

use crate::{
    bounding_box::BoundingBox,
    detector::ObjectDetector,
    labels::display_label,
    outcome::{Outcome, Unrecognized, round_confidence},
    yolov8::{YoloV8, YoloV8Config, YoloV8Error},
};

/// Location of the model weights, relative to the executable's directory.
pub const DEFAULT_MODEL_PATH: &str = "models/nullify_plastic_best.safetensors";

/// Classifier error enum.
#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    /// The model weights file does not exist.
    #[error("Model not found")]
    ModelNotFound,

    /// The input image could not be read or decoded.
    #[error("Failed to read image {}: {message}", .path.display())]
    ImageRead {
        /// Path of the image.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// The detector failed while running.
    #[error("Detection failed: {0}")]
    Detector(String),

    /// The detector returned a class id outside its own class table.
    #[error("Unknown class id: {0}")]
    UnknownClassId(u32),

    /// The model could not be loaded.
    #[error(transparent)]
    Model(#[from] YoloV8Error),
}

/// Classifier configuration struct.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Path to the `safetensors` weights; the manifest sits next to it
    pub model_path: PathBuf,
    /// Confidence floor applied by the model itself
    pub detection_threshold: f32,
    /// The non-maximum suppression threshold for the model
    pub nms_threshold: f32,
    /// Best detections below this confidence are not reported
    pub report_threshold: f32,
    /// Whether to use the CPU or GPU
    pub use_cpu: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let detector = YoloV8Config::default();
        Self {
            model_path: default_model_path(),
            detection_threshold: detector.confidence_threshold,
            nms_threshold: detector.nms_threshold,
            report_threshold: 0.40,
            use_cpu: detector.use_cpu,
        }
    }
}

/// Resolve [`DEFAULT_MODEL_PATH`] against the directory of the running executable.
///
/// Falls back to the working directory when the executable path is unknown.
pub fn default_model_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join(DEFAULT_MODEL_PATH))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}

/// Plastic waste classifier.
///
/// Each call to [`PlasticClassifier::run_inference`] loads the model, runs it
/// on one image and reduces the detections to a single [`Outcome`].
#[derive(Debug, Clone, Default)]
pub struct PlasticClassifier {
    config: ClassifierConfig,
}

impl PlasticClassifier {
    /// Create a new classifier
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Check that the model weights exist and return their path.
    pub fn locate_model(&self) -> Result<&Path, ClassifierError> {
        let path = self.config.model_path.as_path();
        if path.is_file() {
            Ok(path)
        } else {
            tracing::warn!(path = %path.display(), "model weights not found");
            Err(ClassifierError::ModelNotFound)
        }
    }

    /// Classify the plastic item in an image file.
    ///
    /// Never fails: every error is reported as [`Outcome::Error`].
    pub fn run_inference(&self, image_path: &Path) -> Outcome {
        match self.try_run_inference(image_path) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(image = %image_path.display(), error = %err, "classification failed");
                Outcome::error(err)
            }
        }
    }

    fn try_run_inference(&self, image_path: &Path) -> Result<Outcome, ClassifierError> {
        let model_path = self.locate_model()?;
        let model = YoloV8::from_file(
            model_path,
            YoloV8Config {
                confidence_threshold: self.config.detection_threshold,
                nms_threshold: self.config.nms_threshold,
                use_cpu: self.config.use_cpu,
            },
        )?;
        let image = read_image(image_path)?;
        self.classify(&model, &image)
    }

    /// Run a detector on an image and classify its detections.
    pub fn classify<D: ObjectDetector>(
        &self,
        detector: &D,
        image: &Image<u8, 3>,
    ) -> Result<Outcome, ClassifierError> {
        let detections = detector
            .detect(image)
            .map_err(|e| ClassifierError::Detector(e.to_string()))?;
        self.evaluate(&detections, |class| detector.class_name(class))
    }

    /// Reduce a list of detections to an outcome.
    ///
    /// The detection with the strictly highest confidence wins, so the first
    /// of several equally confident detections is kept.
    pub fn evaluate<'a>(
        &self,
        detections: &[BoundingBox],
        class_name: impl Fn(u32) -> Option<&'a str>,
    ) -> Result<Outcome, ClassifierError> {
        let Some(best) = best_detection(detections) else {
            tracing::debug!("no detections");
            return Ok(Outcome::Unrecognized(Unrecognized::NoDetection));
        };
        tracing::debug!(
            candidates = detections.len(),
            class = best.class,
            confidence = best.confidence,
            "selected detection"
        );

        let confidence = round_confidence(best.confidence);
        if best.confidence < self.config.report_threshold {
            return Ok(Outcome::Unrecognized(Unrecognized::LowConfidence {
                confidence,
            }));
        }

        let name = class_name(best.class).ok_or(ClassifierError::UnknownClassId(best.class))?;
        Ok(match display_label(name) {
            Some(label) => Outcome::Recognized {
                object_type: label.to_string(),
                confidence,
            },
            None => Outcome::Unrecognized(Unrecognized::UnknownClass {
                class: name.to_string(),
            }),
        })
    }
}

fn best_detection(detections: &[BoundingBox]) -> Option<&BoundingBox> {
    detections.iter().fold(None, |best, bbox| match best {
        Some(b) if bbox.confidence > b.confidence => Some(bbox),
        None => Some(bbox),
        best => best,
    })
}

fn read_image(path: &Path) -> Result<Image<u8, 3>, ClassifierError> {
    kornia_io::functional::read_image_any(path).map_err(|e| ClassifierError::ImageRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
