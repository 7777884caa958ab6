use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;

use super::error::ClassifierError;
use super::Classify;

/// Replays classifier output recorded earlier, keyed by image filename.
///
/// Handy for re-scoring a run without the model, or for feeding labels produced
/// by another tool. The predictions file is a JSON object:
///
/// ```json
/// { "Collie_03797.jpg": "collie", "Maltese_01.jpg": "Maltese dog, Maltese terrier, Maltese" }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplayClassifier {
    labels: HashMap<String, String>,
}

impl ReplayClassifier {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    /// Loads recorded predictions from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ClassifierError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ClassifierError::LabelsError(format!("{}: {}", path.display(), e)))?;
        let labels: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::LabelsError(format!("{}: {}", path.display(), e)))?;
        info!("Loaded {} recorded predictions from {:?}", labels.len(), path);
        Ok(Self::new(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Classify for ReplayClassifier {
    fn classify(&self, image_path: &Path) -> Result<String, ClassifierError> {
        let filename = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClassifierError::ValidationError(format!("No filename in {}", image_path.display())))?;

        self.labels
            .get(filename)
            .cloned()
            .ok_or_else(|| ClassifierError::PredictionError(format!("No recorded prediction for {}", filename)))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplayClassifier {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_replay_by_filename() {
        let classifier: ReplayClassifier = [("Collie_03797.jpg", "collie")].into_iter().collect();
        assert_eq!(classifier.classify(Path::new("pet_images/Collie_03797.jpg")).unwrap(), "collie");
        assert!(matches!(
            classifier.classify(Path::new("pet_images/Beagle_01.jpg")),
            Err(ClassifierError::PredictionError(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cat_01.jpg": "tabby, tabby cat"}}"#).unwrap();
        let classifier = ReplayClassifier::from_json_file(file.path()).unwrap();
        assert_eq!(classifier.len(), 1);
        assert_eq!(classifier.classify(Path::new("cat_01.jpg")).unwrap(), "tabby, tabby cat");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(matches!(
            ReplayClassifier::from_json_file(file.path()),
            Err(ClassifierError::LabelsError(_))
        ));
    }
}
