use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::error::{Diagnostic, EvalError};
use super::record::{Labeled, Matched, PetRecord, ResultSet};
use crate::classifier::Classify;

/// Lowercases and trims a raw classifier label. The comma-separated structure is kept.
pub fn normalize_label(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Splits a classifier label into its trimmed, comma-separated terms.
pub fn label_terms(label: &str) -> impl Iterator<Item = &str> {
    label.split(',').map(str::trim)
}

/// True when `pet_label` equals one of the terms of `classifier_label` exactly.
///
/// A wholly empty classifier label never matches. Empty inner terms (`"cat, , dog"`)
/// are ordinary terms and match an empty pet label.
pub fn labels_match(pet_label: &str, classifier_label: &str) -> bool {
    if classifier_label.is_empty() {
        return false;
    }
    label_terms(classifier_label).any(|term| term == pet_label)
}

/// Runs the classifier over every record and records whether its output matches
/// the pet label.
///
/// With `jobs > 1` the images are classified on a dedicated rayon pool. A failing
/// or empty classification degrades that record to an empty label with no match
/// and leaves a [`Diagnostic::ClassifierFailed`]; the batch carries on.
pub fn classify_images(
    results: ResultSet<Labeled>,
    images_dir: &Path,
    classifier: &dyn Classify,
    jobs: usize,
) -> Result<ResultSet<Matched>, EvalError> {
    let (records, mut diagnostics) = results.into_parts();
    let items: Vec<(String, PetRecord<Labeled>)> = records.into_iter().collect();
    info!("Classifying {} images (jobs: {})", items.len(), jobs.max(1));

    let matched: Vec<(String, PetRecord<Matched>, Option<Diagnostic>)> = if jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()?;
        pool.install(|| {
            items
                .into_par_iter()
                .map(|(filename, record)| classify_one(filename, record, images_dir, classifier))
                .collect()
        })
    } else {
        items
            .into_iter()
            .map(|(filename, record)| classify_one(filename, record, images_dir, classifier))
            .collect()
    };

    let mut records = BTreeMap::new();
    for (filename, record, diagnostic) in matched {
        diagnostics.extend(diagnostic);
        records.insert(filename, record);
    }

    Ok(ResultSet::from_parts(records, diagnostics))
}

fn classify_one(
    filename: String,
    record: PetRecord<Labeled>,
    images_dir: &Path,
    classifier: &dyn Classify,
) -> (String, PetRecord<Matched>, Option<Diagnostic>) {
    let image_path = images_dir.join(&filename);

    let (classifier_label, diagnostic) = match classifier.classify(&image_path) {
        Ok(raw) => {
            let label = normalize_label(&raw);
            if label.is_empty() {
                warn!("Classifier returned an empty label for {}", filename);
                let diagnostic = Diagnostic::ClassifierFailed {
                    filename: filename.clone(),
                    reason: "empty label".to_string(),
                };
                (label, Some(diagnostic))
            } else {
                (label, None)
            }
        }
        Err(e) => {
            warn!("Classifier failed for {}: {}", filename, e);
            let diagnostic = Diagnostic::ClassifierFailed {
                filename: filename.clone(),
                reason: e.to_string(),
            };
            (String::new(), Some(diagnostic))
        }
    };

    let is_match = labels_match(&record.pet_label, &classifier_label);
    debug!(
        "{}: pet {:?} / classifier {:?} -> match {}",
        filename, record.pet_label, classifier_label, is_match
    );

    (filename, record.into_matched(classifier_label, is_match), diagnostic)
}
