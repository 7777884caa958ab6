use std::collections::HashMap;
use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::{Array1, Array4};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use crate::models::{ModelCharacteristics, Preprocessing};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
/// Per-channel means in B, G, R order on the 0-255 scale.
const CAFFE_BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// Turns a decoded image into a `[1, 3, size, size]` NCHW tensor.
///
/// The image is resized to cover the square input and center-cropped, then
/// normalised according to the model's [`Preprocessing`].
pub(crate) fn preprocess(image: &DynamicImage, characteristics: &ModelCharacteristics) -> Array4<f32> {
    let size = characteristics.input_size;
    let rgb = image.resize_to_fill(size, size, FilterType::Triangle).to_rgb8();

    let side = size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b] = pixel.0;
        match characteristics.preprocessing {
            Preprocessing::ImageNet => {
                for (channel, value) in [r, g, b].into_iter().enumerate() {
                    input[[0, channel, y, x]] =
                        (value as f32 / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
                }
            }
            Preprocessing::CaffeBgr => {
                for (channel, value) in [b, g, r].into_iter().enumerate() {
                    input[[0, channel, y, x]] = value as f32 - CAFFE_BGR_MEAN[channel];
                }
            }
        }
    }
    input
}

/// Runs image classification models through ONNX Runtime.
///
/// The ONNX model is expected to:
/// - Accept a single float input of shape [1, 3, input_size, input_size]
/// - Output one score per class, shape [1, num_classes] (trailing unit dims are tolerated)
///
/// Implemented by both the builder, which uses it to probe a freshly loaded model,
/// and the finished classifier.
pub(crate) trait ImageInference {
    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the input and output characteristics of the loaded model
    fn characteristics(&self) -> Option<&ModelCharacteristics>;

    /// Opens and preprocesses an image file.
    ///
    /// # Errors
    /// - `ModelError` if the characteristics are not set
    /// - `ImageError` if the file cannot be opened or decoded
    fn load_image(&self, path: &Path) -> Result<Array4<f32>, ClassifierError> {
        let characteristics = self.characteristics()
            .ok_or_else(|| ClassifierError::ModelError("Model characteristics not set".into()))?;
        let image = image::open(path)
            .map_err(|e| ClassifierError::ImageError(format!("{}: {}", path.display(), e)))?;
        Ok(preprocess(&image, characteristics))
    }

    /// Feeds a preprocessed tensor through the model and returns the raw class scores.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized or the model run fails
    /// - `PredictionError` if the output does not hold one score per class
    fn run_scores(&self, input: Array4<f32>) -> Result<Array1<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;
        let input_name = session.inputs.first()
            .map(|input| input.name.as_str())
            .ok_or_else(|| ClassifierError::ModelError("Model has no inputs".into()))?;

        let input_dyn = input.into_dyn();
        let input_array = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(input_name, Tensor::from_array(&input_array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let scores = Array1::from_iter(output_tensor.iter().copied());
        if let Some(characteristics) = self.characteristics() {
            if scores.len() != characteristics.num_classes {
                return Err(ClassifierError::PredictionError(format!(
                    "Expected {} class scores, model produced {}",
                    characteristics.num_classes,
                    scores.len()
                )));
            }
        }
        Ok(scores)
    }

    /// Loads an image and returns the model's class scores for it.
    fn image_scores(&self, path: &Path) -> Result<Array1<f32>, ClassifierError> {
        let input = self.load_image(path)?;
        self.run_scores(input)
    }
}
