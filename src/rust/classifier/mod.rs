mod builder;
mod classifier;
mod error;
mod inference;
mod replay;
mod utils;

use std::path::{Path, PathBuf};

pub use builder::OnnxClassifierBuilder;
pub use classifier::{OnnxClassifier, Prediction};
pub use error::ClassifierError;
pub use replay::ReplayClassifier;

/// Anything that can put a free-text label on an image.
///
/// The label may list several comma-separated synonyms, e.g.
/// `"Maltese dog, Maltese terrier, Maltese"`. Implementations are shared across
/// evaluation workers, hence the `Send + Sync` bound.
pub trait Classify: Send + Sync {
    fn classify(&self, image_path: &Path) -> Result<String, ClassifierError>;
}

/// Information about a loaded classifier model
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub num_classes: usize,
    pub input_size: u32,
}
