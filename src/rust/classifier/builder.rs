use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use ndarray::Array4;
use ort::session::Session;

use super::classifier::OnnxClassifier;
use super::error::ClassifierError;
use super::inference::ImageInference;
use super::utils::synset_label;
use crate::models::{BuiltinModel, ModelCharacteristics, Preprocessing};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelManager;

/// A builder for constructing an [`OnnxClassifier`] with a fluent interface.
#[derive(Default, Debug)]
pub struct OnnxClassifierBuilder {
    models_dir: Option<PathBuf>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    session: Option<Session>,
    labels: Option<Vec<String>>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl ImageInference for OnnxClassifierBuilder {
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        self.model_characteristics.as_ref()
    }
}

impl OnnxClassifierBuilder {
    /// Creates a new empty builder with the default runtime configuration
    ///
    /// # Example
    /// ```
    /// use breedcheck::OnnxClassifierBuilder;
    ///
    /// let builder = OnnxClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// Must be called before the model is loaded to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Looks for builtin models under `models_dir` instead of the default cache directory
    pub fn with_models_dir(mut self, models_dir: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(models_dir.into());
        self
    }

    /// Loads one of the builtin CNNs from the model cache
    ///
    /// # Returns
    /// The builder instance if successful, or an error if:
    /// - A model is already set
    /// - The model is not downloaded
    /// - The model or label file failed to load
    /// - The model structure is invalid
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }

        let manager = match &self.models_dir {
            Some(dir) => ModelManager::new(dir),
            None => ModelManager::new_default(),
        }
        .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;

        let (model_path, labels_path) = manager.require_model(model).map_err(|e| {
            ClassifierError::BuildError(format!(
                "{}. Please download it first using ModelManager::download_model()",
                e
            ))
        })?;
        self.load(model_path, labels_path, model.characteristics())
    }

    /// Uses an arbitrary ONNX image classifier and label file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `labels_path` - Path to the class label file, one class per line, optionally
    ///   prefixed by a WordNet id
    /// * `characteristics` - Input requirements of the model. When `None`, a 224x224
    ///   ImageNet-normalised input is assumed and the class count is taken from the label file.
    pub fn with_custom_model(
        self,
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
        characteristics: Option<ModelCharacteristics>,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        let labels_path = labels_path.as_ref();

        if model_path.as_os_str().is_empty() || labels_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model and labels paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }
        if !model_path.exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path.display())));
        }
        if !labels_path.exists() {
            return Err(ClassifierError::BuildError(format!("Labels file not found: {}", labels_path.display())));
        }

        let characteristics = match characteristics {
            Some(characteristics) => characteristics,
            None => ModelCharacteristics {
                input_size: 224,
                num_classes: load_labels(labels_path)?.len(),
                preprocessing: Preprocessing::ImageNet,
                model_size_mb: 0,
            },
        };

        self.load(model_path.to_path_buf(), labels_path.to_path_buf(), characteristics)
    }

    fn load(
        mut self,
        model_path: PathBuf,
        labels_path: PathBuf,
        characteristics: ModelCharacteristics,
    ) -> Result<Self, ClassifierError> {
        let labels = load_labels(&labels_path)?;
        info!("Loaded {} class labels from {:?}", labels.len(), labels_path);

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)
            .map_err(|e| {
                error!("Failed to load model {:?}: {}", model_path, e);
                ClassifierError::BuildError(format!("Failed to load model: {}", e))
            })?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path);
        self.labels_path = Some(labels_path);
        self.labels = Some(labels);
        self.session = Some(session);
        self.model_characteristics = Some(characteristics);
        Ok(self)
    }

    /// Builds the classifier.
    ///
    /// The label count must agree with the model's class count, which is confirmed
    /// by running a blank image through the model once.
    pub fn build(self) -> Result<OnnxClassifier, ClassifierError> {
        let characteristics = self.model_characteristics
            .ok_or_else(|| ClassifierError::BuildError("No model set".to_string()))?;
        let labels = self.labels.as_ref()
            .ok_or_else(|| ClassifierError::BuildError("No class labels loaded".to_string()))?;

        if labels.len() != characteristics.num_classes {
            return Err(ClassifierError::ValidationError(format!(
                "Label file has {} entries but the model scores {} classes",
                labels.len(),
                characteristics.num_classes
            )));
        }

        let side = characteristics.input_size as usize;
        self.run_scores(Array4::zeros((1, 3, side, side)))?;
        info!("Model probe succeeded with {} classes", characteristics.num_classes);

        let (Some(model_path), Some(labels_path), Some(session), Some(labels)) =
            (self.model_path, self.labels_path, self.session, self.labels)
        else {
            return Err(ClassifierError::BuildError("Incomplete builder state".to_string()));
        };

        Ok(OnnxClassifier {
            model_path,
            labels_path,
            session: Arc::new(session),
            labels: Arc::new(labels),
            model_characteristics: characteristics,
        })
    }

    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.len() != 1 {
            return Err(ClassifierError::ModelError(format!(
                "Model must have exactly 1 image input, found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class scores".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads a class label file, one class per non-empty line.
pub(crate) fn load_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ClassifierError::LabelsError(format!("{}: {}", path.display(), e)))?;

    let labels: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| synset_label(line).to_string())
        .collect();

    if labels.is_empty() {
        return Err(ClassifierError::LabelsError(format!("{}: no labels found", path.display())));
    }
    Ok(labels)
}
