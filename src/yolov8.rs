use std::path::{Path, PathBuf};

use super::{
    bounding_box::{BoundingBox, non_maximum_suppression},
    detector::ObjectDetector,
    model::{Multiples, YoloV8 as YoloV8Model},
};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Module, VarBuilder};
use kornia_image::{Image, ImageSize};
use serde::Deserialize;

/// YOLOv8 error enum.
#[derive(thiserror::Error, Debug)]
pub enum YoloV8Error {
    /// Failed to load YOLOv8 model.
    #[error("Failed to load YOLOv8 model: {0}")]
    LoadModelError(String),

    /// The model manifest could not be parsed.
    #[error("Invalid model manifest: {0}")]
    ManifestError(#[from] serde_json::Error),

    /// Failed to read a model file.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The input image cannot be fed to the network.
    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    /// Internal candle error.
    #[error(transparent)]
    CandleError(#[from] candle_core::Error),

    /// Kornia image error.
    #[error(transparent)]
    KorniaImageError(#[from] kornia_image::ImageError),
}

/// YOLOv8 model size enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum YoloV8Size {
    /// N model size.
    N,
    /// S model size.
    S,
    /// M model size.
    M,
    /// L model size.
    L,
    /// X model size.
    X,
}

impl TryFrom<String> for YoloV8Size {
    type Error = YoloV8Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(match s.as_str() {
            "n" => YoloV8Size::N,
            "s" => YoloV8Size::S,
            "m" => YoloV8Size::M,
            "l" => YoloV8Size::L,
            "x" => YoloV8Size::X,
            _ => return Err(YoloV8Error::LoadModelError(format!("Invalid size: {s}"))),
        })
    }
}

impl std::fmt::Display for YoloV8Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                YoloV8Size::N => "n",
                YoloV8Size::S => "s",
                YoloV8Size::M => "m",
                YoloV8Size::L => "l",
                YoloV8Size::X => "x",
            }
        )
    }
}

impl YoloV8Size {
    fn multiples(&self) -> Multiples {
        match self {
            YoloV8Size::N => Multiples::n(),
            YoloV8Size::S => Multiples::s(),
            YoloV8Size::M => Multiples::m(),
            YoloV8Size::L => Multiples::l(),
            YoloV8Size::X => Multiples::x(),
        }
    }
}

/// Description of a trained model, stored as JSON next to its weights.
///
/// ```json
/// { "size": "n", "names": ["combined_plastic", "plastic_bag", "plastic_bottle", "plastic_can"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    /// The size of the network the weights were trained for.
    pub size: YoloV8Size,
    /// Class names, indexed by class id.
    pub names: Vec<String>,
}

impl ModelManifest {
    /// Path of the manifest belonging to a weights file.
    pub fn path_for(weights_path: &Path) -> PathBuf {
        weights_path.with_extension("json")
    }

    /// Read a manifest from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, YoloV8Error> {
        let content = std::fs::read_to_string(path).map_err(|source| YoloV8Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// YOLOv8 configuration struct.
#[derive(Debug, Clone)]
pub struct YoloV8Config {
    /// Detections scoring at or below this value are discarded
    pub confidence_threshold: f32,
    /// The non-maximum suppression threshold for the model
    pub nms_threshold: f32,
    /// Whether to use the CPU or GPU
    pub use_cpu: bool,
}

/// Default configuration for YOLOv8.
impl Default for YoloV8Config {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            nms_threshold: 0.7,
            use_cpu: true,
        }
    }
}

/// YOLOv8 high level interface.
pub struct YoloV8 {
    config: YoloV8Config,
    device: Device,
    model: YoloV8Model,
    names: Vec<String>,
}

impl YoloV8 {
    /// Load a model from a `safetensors` weights file and its manifest.
    pub fn from_file(weights_path: &Path, config: YoloV8Config) -> Result<Self, YoloV8Error> {
        let manifest = ModelManifest::from_file(&ModelManifest::path_for(weights_path))?;
        let device = if config.use_cpu {
            Device::Cpu
        } else {
            Device::cuda_if_available(0)
                .map_err(|_| YoloV8Error::LoadModelError("cuda:0 error".to_string()))?
        };

        tracing::info!(
            path = %weights_path.display(),
            size = %manifest.size,
            classes = manifest.names.len(),
            "loading detection model"
        );

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)?
        };
        Self::from_var_builder(vb, manifest, config)
    }

    /// Build a model from already loaded weights.
    pub fn from_var_builder(
        vb: VarBuilder,
        manifest: ModelManifest,
        config: YoloV8Config,
    ) -> Result<Self, YoloV8Error> {
        if manifest.names.is_empty() {
            return Err(YoloV8Error::LoadModelError(
                "model manifest lists no classes".to_string(),
            ));
        }
        let device = vb.device().clone();
        let model = YoloV8Model::load(vb, manifest.size.multiples(), manifest.names.len())?;
        Ok(Self {
            config,
            device,
            model,
            names: manifest.names,
        })
    }

    /// Perform inference on an rgb8 image
    pub fn inference(&self, image: &Image<u8, 3>) -> Result<Vec<BoundingBox>, YoloV8Error> {
        // preprocess the image
        let (image_t, w_ratio, h_ratio) = self.preprocess_image(image)?;

        // forward the image
        let pred = self.model.forward(&image_t)?.squeeze(0)?;

        // postprocess the predictions
        let detections = self.postprocess_predictions(&pred, w_ratio, h_ratio)?;
        tracing::debug!(count = detections.len(), "inference done");
        Ok(detections)
    }

    fn preprocess_image(&self, image: &Image<u8, 3>) -> Result<(Tensor, f32, f32), YoloV8Error> {
        if image.width() == 0 || image.height() == 0 {
            return Err(YoloV8Error::InvalidImage("empty image".to_string()));
        }
        let (width, height) = {
            let w = image.width();
            let h = image.height();
            if w < h {
                let w = w * 640 / h;
                // Sizes have to be divisible by 32.
                (w / 32 * 32, 640)
            } else {
                let h = h * 640 / w;
                (640, h / 32 * 32)
            }
        };
        if width == 0 || height == 0 {
            return Err(YoloV8Error::InvalidImage(format!(
                "{}x{} is too elongated to resize",
                image.width(),
                image.height()
            )));
        }

        let w_ratio = image.width() as f32 / width as f32;
        let h_ratio = image.height() as f32 / height as f32;

        let mut image_resized = Image::from_size_val(ImageSize { width, height }, 0)?;
        kornia_imgproc::resize::resize_fast(
            image,
            &mut image_resized,
            kornia_imgproc::interpolation::InterpolationMode::Nearest,
        )?;

        let image_resized = image_resized.map(|&x| x as f32 / 255.0);

        let image_t =
            Tensor::from_vec::<_, f32>(image_resized.into_vec(), (height, width, 3), &self.device)?
                .permute((2, 0, 1))?
                .unsqueeze(0)?;

        Ok((image_t, w_ratio, h_ratio))
    }

    fn postprocess_predictions(
        &self,
        pred: &Tensor,
        w_ratio: f32,
        h_ratio: f32,
    ) -> Result<Vec<BoundingBox>, YoloV8Error> {
        let (pred_size, _npreds) = pred.dims2()?;
        let nclasses = pred_size - 4;
        let mut bboxes: Vec<Vec<BoundingBox>> = (0..nclasses).map(|_| Vec::new()).collect();
        // one row per anchor: cx, cy, w, h, class scores
        for pred in pred.t()?.contiguous()?.to_vec2::<f32>()? {
            let (class_index, confidence) = pred[4..]
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, score)| {
                    if score > best.1 { (i, score) } else { best }
                });
            if confidence > self.config.confidence_threshold {
                bboxes[class_index].push(BoundingBox {
                    xmin: (pred[0] - pred[2] / 2.0) * w_ratio,
                    ymin: (pred[1] - pred[3] / 2.0) * h_ratio,
                    xmax: (pred[0] + pred[2] / 2.0) * w_ratio,
                    ymax: (pred[1] + pred[3] / 2.0) * h_ratio,
                    confidence,
                    class: class_index as u32,
                });
            }
        }

        non_maximum_suppression(&mut bboxes, self.config.nms_threshold);

        Ok(bboxes.into_iter().flatten().collect())
    }
}

impl ObjectDetector for YoloV8 {
    type Error = YoloV8Error;

    fn detect(&self, image: &Image<u8, 3>) -> Result<Vec<BoundingBox>, Self::Error> {
        self.inference(image)
    }

    fn class_name(&self, class: u32) -> Option<&str> {
        self.names.get(class as usize).map(String::as_str)
    }
}
