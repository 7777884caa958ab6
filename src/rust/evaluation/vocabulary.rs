use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use super::error::EvalError;

/// Reference set of dog names, one canonical lowercase entry per line of the dog file.
///
/// Built once and only read afterwards, so it can be shared across workers by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    names: HashSet<String>,
}

impl Vocabulary {
    /// Loads the vocabulary from a newline-delimited file.
    ///
    /// Lines are trimmed and blank lines ignored. Repeated lines are harmless.
    /// A file that cannot be opened or read is a fatal configuration error.
    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let to_error = |source: std::io::Error| EvalError::Vocabulary {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(to_error)?);

        let mut names = HashSet::new();
        for line in reader.lines() {
            let line = line.map_err(to_error)?;
            let name = line.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }

        info!("Loaded {} dog names from {:?}", names.len(), path);
        Ok(Self { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
