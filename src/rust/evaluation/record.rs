use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use super::error::Diagnostic;

/// Stage marker: only the ground-truth pet label is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Labeled;

/// Stage data added by the classification matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matched {
    /// Lowercased, trimmed classifier output. Empty when the classifier failed.
    pub classifier_label: String,
    /// True when the pet label equals one of the comma separated classifier terms.
    pub is_match: bool,
}

/// Stage data added by the dog annotator, on top of everything in [`Matched`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotated {
    pub classifier_label: String,
    pub is_match: bool,
    pub pet_is_dog: bool,
    pub classifier_is_dog: bool,
}

/// A single image's evaluation record.
///
/// The stage parameter moves strictly forward, `Labeled -> Matched -> Annotated`,
/// and each transition consumes the previous record. An annotation can therefore
/// never be computed for a record the classifier has not seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetRecord<S> {
    pub pet_label: String,
    #[serde(flatten)]
    pub stage: S,
}

impl PetRecord<Labeled> {
    pub fn new(pet_label: impl Into<String>) -> Self {
        Self {
            pet_label: pet_label.into(),
            stage: Labeled,
        }
    }

    pub fn into_matched(self, classifier_label: String, is_match: bool) -> PetRecord<Matched> {
        PetRecord {
            pet_label: self.pet_label,
            stage: Matched {
                classifier_label,
                is_match,
            },
        }
    }
}

impl PetRecord<Matched> {
    pub fn classifier_label(&self) -> &str {
        &self.stage.classifier_label
    }

    pub fn into_annotated(self, pet_is_dog: bool, classifier_is_dog: bool) -> PetRecord<Annotated> {
        PetRecord {
            pet_label: self.pet_label,
            stage: Annotated {
                classifier_label: self.stage.classifier_label,
                is_match: self.stage.is_match,
                pet_is_dog,
                classifier_is_dog,
            },
        }
    }
}

impl PetRecord<Annotated> {
    /// Builds a fully annotated record directly, e.g. when reloading stored results.
    pub fn annotated(
        pet_label: impl Into<String>,
        classifier_label: impl Into<String>,
        is_match: bool,
        pet_is_dog: bool,
        classifier_is_dog: bool,
    ) -> Self {
        Self {
            pet_label: pet_label.into(),
            stage: Annotated {
                classifier_label: classifier_label.into(),
                is_match,
                pet_is_dog,
                classifier_is_dog,
            },
        }
    }

    pub fn classifier_label(&self) -> &str {
        &self.stage.classifier_label
    }

    pub fn is_match(&self) -> bool {
        self.stage.is_match
    }

    pub fn pet_is_dog(&self) -> bool {
        self.stage.pet_is_dog
    }

    pub fn classifier_is_dog(&self) -> bool {
        self.stage.classifier_is_dog
    }
}

/// Filename-keyed collection of records that all sit at the same stage,
/// together with the diagnostics collected on the way there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet<S> {
    records: BTreeMap<String, PetRecord<S>>,
    diagnostics: Vec<Diagnostic>,
}

impl<S> Default for ResultSet<S> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl<S> ResultSet<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record unless the filename is already present.
    ///
    /// Returns `false` for a duplicate; the first-seen record is kept and a
    /// [`Diagnostic::DuplicateFile`] is recorded.
    pub fn insert(&mut self, filename: impl Into<String>, record: PetRecord<S>) -> bool {
        let filename = filename.into();
        if self.records.contains_key(&filename) {
            warn!("Duplicate file detected: {}", filename);
            self.diagnostics.push(Diagnostic::DuplicateFile { filename });
            return false;
        }
        self.records.insert(filename, record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&PetRecord<S>> {
        self.records.get(filename)
    }

    /// Iterates records in filename order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PetRecord<S>)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Splits the set into its records and diagnostics so a stage can rebuild it
    /// at the next stage.
    pub(crate) fn into_parts(self) -> (BTreeMap<String, PetRecord<S>>, Vec<Diagnostic>) {
        (self.records, self.diagnostics)
    }

    pub(crate) fn from_parts(
        records: BTreeMap<String, PetRecord<S>>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            records,
            diagnostics,
        }
    }
}

impl<S> FromIterator<(String, PetRecord<S>)> for ResultSet<S> {
    fn from_iter<I: IntoIterator<Item = (String, PetRecord<S>)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (filename, record) in iter {
            set.insert(filename, record);
        }
        set
    }
}
