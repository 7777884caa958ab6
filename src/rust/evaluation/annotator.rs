use log::debug;

use super::matcher::label_terms;
use super::record::{Annotated, Matched, ResultSet};
use super::vocabulary::Vocabulary;

/// True when any trimmed term of the classifier label is a known dog name.
pub fn classifier_is_dog(classifier_label: &str, dognames: &Vocabulary) -> bool {
    label_terms(classifier_label).any(|term| dognames.contains(term))
}

/// Flags every matched record with whether the pet label and the classifier label
/// name a dog.
///
/// The pet label is looked up whole; the classifier label term by term.
pub fn adjust_results_isadog(results: ResultSet<Matched>, dognames: &Vocabulary) -> ResultSet<Annotated> {
    let (records, diagnostics) = results.into_parts();

    let records = records
        .into_iter()
        .map(|(filename, record)| {
            let pet_is_dog = dognames.contains(&record.pet_label);
            let classifier_is_dog = classifier_is_dog(record.classifier_label(), dognames);
            debug!(
                "{}: pet is dog {} / classifier is dog {}",
                filename, pet_is_dog, classifier_is_dog
            );
            (filename, record.into_annotated(pet_is_dog, classifier_is_dog))
        })
        .collect();

    ResultSet::from_parts(records, diagnostics)
}
