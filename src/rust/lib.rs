//! Scores CNN image classifiers against ground-truth pet labels.
//!
//! Ground truth comes from image filenames (`Boston_terrier_02259.jpg` is a
//! `"boston terrier"`), a dog-name vocabulary decides what counts as a dog, and the
//! classifier is anything implementing [`Classify`]. The result is the annotated
//! record set plus a fixed [`Summary`] of counts and percentages.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use breedcheck::evaluation::{adjust_results_isadog, classify_images, labels_from_filenames};
//! use breedcheck::{ReplayClassifier, Summary, Vocabulary};
//! use std::path::Path;
//!
//! let dognames: Vocabulary = ["collie", "maltese"].into_iter().collect();
//! let classifier: ReplayClassifier = [
//!     ("Collie_03797.jpg", "collie"),
//!     ("cat_01.jpg", "tabby, tabby cat"),
//! ].into_iter().collect();
//!
//! let labeled = labels_from_filenames(["Collie_03797.jpg", "cat_01.jpg"]);
//! let matched = classify_images(labeled, Path::new("pet_images"), &classifier, 1)?;
//! let annotated = adjust_results_isadog(matched, &dognames);
//!
//! let summary = Summary::from_results(&annotated);
//! assert_eq!(summary.pct_correct_dogs, 100.0);
//! assert_eq!(summary.pct_correct_notdogs, 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # CNN models
//!
//! [`OnnxClassifier`] runs one of the [`BuiltinModel`]s (ResNet, AlexNet, VGG)
//! through ONNX Runtime. [`ModelManager`] downloads and verifies the model files.

pub mod classifier;
pub mod evaluation;
pub mod model_manager;
pub mod models;
pub mod report;
mod runtime;

pub use classifier::{
    ClassifierError, ClassifierInfo, Classify, OnnxClassifier, OnnxClassifierBuilder, Prediction,
    ReplayClassifier,
};
pub use evaluation::{
    evaluate, Diagnostic, EvalError, Evaluation, EvaluationOptions, Summary, Vocabulary,
};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo, Preprocessing};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
