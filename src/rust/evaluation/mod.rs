//! The label matching and statistics pipeline.
//!
//! Stages run in a fixed order and each one consumes the previous stage's
//! [`ResultSet`]:
//!
//! 1. [`labels::get_pet_labels`] derives ground-truth labels from filenames
//! 2. [`matcher::classify_images`] runs a [`Classify`] backend and marks matches
//! 3. [`annotator::adjust_results_isadog`] flags dog / not-dog on both sides
//! 4. [`Summary::from_results`] reduces the annotated set to counts and rates

pub mod annotator;
pub mod error;
pub mod labels;
pub mod matcher;
pub mod record;
pub mod stats;
pub mod vocabulary;

use std::path::Path;

use log::info;
use serde::Serialize;

use crate::classifier::Classify;

pub use annotator::{adjust_results_isadog, classifier_is_dog};
pub use error::{Diagnostic, EvalError};
pub use labels::{get_pet_labels, labels_from_filenames, pet_label};
pub use matcher::{classify_images, labels_match, normalize_label};
pub use record::{Annotated, Labeled, Matched, PetRecord, ResultSet};
pub use stats::{Stat, Summary, STAT_KEYS};
pub use vocabulary::Vocabulary;

/// Knobs for a single evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Number of images classified concurrently. `1` keeps everything on the caller's thread.
    pub jobs: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// The annotated records of a run together with their summary.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub results: ResultSet<Annotated>,
    pub summary: Summary,
}

impl Evaluation {
    pub fn from_results(results: ResultSet<Annotated>) -> Self {
        let summary = Summary::from_results(&results);
        Self { results, summary }
    }
}

/// Runs every stage over the images in `images_dir`.
///
/// Only configuration problems (unreadable directory, worker pool) are returned
/// as errors; per-image trouble ends up in the result set's diagnostics.
pub fn evaluate(
    images_dir: &Path,
    dognames: &Vocabulary,
    classifier: &dyn Classify,
    options: &EvaluationOptions,
) -> Result<Evaluation, EvalError> {
    let labeled = labels::get_pet_labels(images_dir)?;
    info!("Found {} images in {:?}", labeled.len(), images_dir);

    let matched = matcher::classify_images(labeled, images_dir, classifier, options.jobs)?;
    let annotated = annotator::adjust_results_isadog(matched, dognames);

    let evaluation = Evaluation::from_results(annotated);
    info!(
        "Evaluation finished: {} images, {} diagnostics",
        evaluation.summary.n_images,
        evaluation.results.diagnostics().len()
    );
    Ok(evaluation)
}
