use std::io;
use std::path::PathBuf;

/// Configuration-level failures. Any of these makes the whole evaluation moot,
/// so they propagate to the caller instead of being absorbed per item.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Cannot read image directory {path:?}: {source}")]
    ImageDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot read vocabulary file {path:?}: {source}")]
    Vocabulary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Non-fatal issues recorded while building and enriching a result set.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The same filename was offered twice; the first occurrence was kept.
    DuplicateFile { filename: String },
    /// The classifier failed or returned nothing usable for this file.
    ClassifierFailed { filename: String, reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateFile { filename } => write!(f, "Duplicate file detected: {}", filename),
            Self::ClassifierFailed { filename, reason } => {
                write!(f, "Classifier failed for {}: {}", filename, reason)
            }
        }
    }
}
