//! Text and JSON rendering of an [`Evaluation`]. Nothing here feeds back into the pipeline.

use std::fmt;

use serde::Serialize;

use crate::evaluation::{Annotated, Evaluation, PetRecord, ResultSet, Summary};

const RULE_WIDTH: usize = 70;

/// Records where the classifier got dog / not-dog wrong.
pub fn incorrect_dogs(results: &ResultSet<Annotated>) -> Vec<(&str, &PetRecord<Annotated>)> {
    results
        .iter()
        .filter(|(_, record)| record.pet_is_dog() != record.classifier_is_dog())
        .collect()
}

/// Dog images the classifier recognised as a dog, but as the wrong breed.
pub fn incorrect_breeds(results: &ResultSet<Annotated>) -> Vec<(&str, &PetRecord<Annotated>)> {
    results
        .iter()
        .filter(|(_, record)| record.pet_is_dog() && record.classifier_is_dog() && !record.is_match())
        .collect()
}

/// Text summary of one model's results. Render with `to_string()` or `{}`.
pub struct SummaryReport<'a> {
    pub summary: &'a Summary,
    pub model: &'a str,
}

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;
        banner(f, &format!("*** Results Summary for {} CNN Model ***", self.model.to_uppercase()))?;
        writeln!(f, "\n--- Image Counts ---")?;
        writeln!(f, "{:<35} {:>5}", "Total Images Processed:", summary.n_images)?;
        writeln!(f, "{:<35} {:>5}", "Dog Images:", summary.n_dogs_img)?;
        writeln!(f, "{:<35} {:>5}", "Non-Dog Images:", summary.n_notdogs_img)?;
        writeln!(f, "\n--- Classification Accuracy ---")?;
        writeln!(f, "{:<35} {:>6.1}%", "Overall Match Accuracy:", summary.pct_match)?;
        writeln!(f, "{:<35} {:>6.1}%", "Dog Detection Accuracy:", summary.pct_correct_dogs)?;
        writeln!(f, "{:<35} {:>6.1}%", "Breed Identification Accuracy:", summary.pct_correct_breed)?;
        writeln!(f, "{:<35} {:>6.1}%", "Non-Dog Classification Accuracy:", summary.pct_correct_notdogs)?;
        rule(f)
    }
}

/// Listing of dog / not-dog errors, each tagged as a false negative or false positive.
pub struct IncorrectDogsReport<'a>(pub &'a ResultSet<Annotated>);

impl fmt::Display for IncorrectDogsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "*** INCORRECTLY CLASSIFIED DOGS (Dog vs Non-Dog Errors) ***")?;

        let errors = incorrect_dogs(self.0);
        for (i, (filename, record)) in errors.iter().enumerate() {
            let error_type = if record.pet_is_dog() { "FALSE NEGATIVE" } else { "FALSE POSITIVE" };
            writeln!(f, "\n{}. {}", i + 1, filename)?;
            writeln!(f, "   Error Type:       {}", error_type)?;
            writeln!(f, "   True Label:       {}", record.pet_label)?;
            writeln!(f, "   Classifier Label: {}", record.classifier_label())?;
        }

        if errors.is_empty() {
            writeln!(f, "\nNo dog/non-dog classification errors found!")?;
        } else {
            writeln!(f, "\nTotal Errors: {}", errors.len())?;
        }
        rule(f)
    }
}

/// Listing of dog images recognised as a dog but as the wrong breed.
pub struct IncorrectBreedsReport<'a>(pub &'a ResultSet<Annotated>);

impl fmt::Display for IncorrectBreedsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "*** INCORRECTLY CLASSIFIED BREEDS (Breed Identification Errors) ***")?;

        let errors = incorrect_breeds(self.0);
        for (i, (filename, record)) in errors.iter().enumerate() {
            writeln!(f, "\n{}. {}", i + 1, filename)?;
            writeln!(f, "   True Breed:       {}", record.pet_label)?;
            writeln!(f, "   Predicted Breed:  {}", record.classifier_label())?;
        }

        if errors.is_empty() {
            writeln!(f, "\nNo breed identification errors found!")?;
        } else {
            writeln!(f, "\nTotal Breed Errors: {}", errors.len())?;
        }
        rule(f)
    }
}

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    rule(f)?;
    writeln!(f, "{}", title)?;
    rule(f)
}

pub fn render_summary(summary: &Summary, model: &str) -> String {
    SummaryReport { summary, model }.to_string()
}

pub fn render_incorrect_dogs(results: &ResultSet<Annotated>) -> String {
    IncorrectDogsReport(results).to_string()
}

pub fn render_incorrect_breeds(results: &ResultSet<Annotated>) -> String {
    IncorrectBreedsReport(results).to_string()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    model: &'a str,
    #[serde(flatten)]
    evaluation: &'a Evaluation,
}

/// Renders the summary, every record and the diagnostics as pretty-printed JSON.
pub fn render_json(evaluation: &Evaluation, model: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport { model, evaluation })
}
