use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use ndarray::ArrayView1;
use ort::session::Session;

use super::error::ClassifierError;
use super::inference::ImageInference;
use super::utils::{argmax, softmax_at};
use super::{ClassifierInfo, Classify};
use crate::models::ModelCharacteristics;

/// The top class an image classifier picked for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Raw label text, e.g. `"Maltese dog, Maltese terrier, Maltese"`
    pub label: String,
    pub class_index: usize,
    /// Probability of the top class, in [0, 1]
    pub confidence: f32,
}

/// A thread-safe CNN image classifier backed by an ONNX model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync`: the session and label table are
/// shared through `Arc`, everything else is plain data. One instance can serve
/// all evaluation workers.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use breedcheck::{BuiltinModel, OnnxClassifier};
///
/// let classifier = OnnxClassifier::builder()
///     .with_model(BuiltinModel::Vgg)?
///     .build()?;
///
/// let prediction = classifier.predict("pet_images/Collie_03797.jpg".as_ref())?;
/// println!("{} ({:.1}%)", prediction.label, prediction.confidence * 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OnnxClassifier {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub(crate) session: Arc<Session>,
    pub(crate) labels: Arc<Vec<String>>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl ImageInference for OnnxClassifier {
    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        Some(&self.model_characteristics)
    }
}

impl OnnxClassifier {
    /// Creates a new builder for fluent construction
    pub fn builder() -> super::builder::OnnxClassifierBuilder {
        super::builder::OnnxClassifierBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            num_classes: self.labels.len(),
            input_size: self.model_characteristics.input_size,
        }
    }

    /// Classifies a single image file.
    ///
    /// # Errors
    /// - `ImageError` if the image cannot be read
    /// - `ModelError` / `PredictionError` if inference fails or yields no usable score
    pub fn predict(&self, image_path: &Path) -> Result<Prediction, ClassifierError> {
        let scores = self.image_scores(image_path)?;
        let (class_index, _) = argmax(scores.view())
            .ok_or_else(|| ClassifierError::PredictionError("Model produced no usable scores".into()))?;

        let label = self.labels.get(class_index)
            .cloned()
            .ok_or_else(|| ClassifierError::PredictionError(format!("No label for class {}", class_index)))?;
        let confidence = confidence(scores.view(), class_index);

        debug!("{:?} -> {} ({:.3})", image_path, label, confidence);
        Ok(Prediction { label, class_index, confidence })
    }
}

impl Classify for OnnxClassifier {
    fn classify(&self, image_path: &Path) -> Result<String, ClassifierError> {
        self.predict(image_path).map(|prediction| prediction.label)
    }
}

/// Some models already end in a softmax layer; only raw logits are normalised here.
fn confidence(scores: ArrayView1<f32>, index: usize) -> f32 {
    let sum: f32 = scores.sum();
    let is_distribution = scores.iter().all(|&s| (0.0..=1.0).contains(&s)) && (sum - 1.0).abs() < 1e-3;
    if is_distribution {
        scores[index]
    } else {
        softmax_at(scores, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confidence_keeps_probabilities() {
        let probabilities = array![0.1f32, 0.7, 0.2];
        assert!((confidence(probabilities.view(), 1) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_normalises_logits() {
        let logits = array![2.0f32, 8.0, -1.0];
        let value = confidence(logits.view(), 1);
        assert!(value > 0.99 && value <= 1.0);
    }
}
